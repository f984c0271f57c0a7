use crate::entities::ledger_entry_entity as ledger_entries;
use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 余额变动原因
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    /// 发红包扣款
    #[sea_orm(string_value = "packet_send")]
    PacketSend,
    /// 抢红包入账
    #[sea_orm(string_value = "packet_receive")]
    PacketReceive,
    /// 过期/撤回退款
    #[sea_orm(string_value = "packet_refund")]
    PacketRefund,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    pub user_id: i64,
    /// 当前余额 (美分)
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntryResponse {
    pub id: i64,
    /// 变动金额 (美分, 入账为正, 扣款为负)
    pub delta: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub reason: LedgerReason,
    /// 关联红包行ID
    pub packet_id: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ledger_entries::Model> for LedgerEntryResponse {
    fn from(entry: ledger_entries::Model) -> Self {
        Self {
            id: entry.id,
            delta: entry.delta,
            balance_before: entry.balance_before,
            balance_after: entry.balance_after,
            reason: entry.reason,
            packet_id: entry.packet_id,
            description: entry.description,
            created_at: entry.created_at,
        }
    }
}
