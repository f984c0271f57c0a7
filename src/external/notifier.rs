use crate::config::NotifyConfig;
use serde::Serialize;

/// 红包生命周期事件。提交后发出, 仅作通知, 不参与资金事务。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PacketEvent {
    Created {
        packet_no: String,
        sender_id: i64,
        context_id: String,
        total_amount: i64,
        total_count: i64,
    },
    Claimed {
        packet_no: String,
        claimant_id: i64,
        amount: i64,
        claim_order: i64,
    },
    Completed {
        packet_no: String,
    },
    Expired {
        packet_no: String,
        refund_amount: i64,
    },
    Revoked {
        packet_no: String,
        refund_amount: i64,
    },
}

/// 事件通知出口。配置了 webhook 时异步 POST, 否则只记日志。
/// 失败只记 warn, 绝不影响已提交的资金事务。
#[derive(Clone)]
pub struct NotifierService {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl NotifierService {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: config.webhook_url,
        }
    }

    /// fire-and-forget: 调用方必须在事务提交之后再调用
    pub fn notify(&self, event: PacketEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => log::info!("Packet event: {payload}"),
            Err(e) => log::warn!("Failed to serialize packet event: {e}"),
        }

        let Some(url) = self.webhook_url.clone() else {
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post(&url).json(&event).send().await {
                log::warn!("Failed to deliver packet event webhook: {e}");
            }
        });
    }
}
