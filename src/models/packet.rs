use crate::entities::{packet_claim_entity as packet_claims, red_packet_entity as red_packets};
use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 拆分策略: 拼手气 (随机) / 均分
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum PacketPolicy {
    #[sea_orm(string_value = "lucky")]
    Lucky,
    #[sea_orm(string_value = "equal")]
    Equal,
}

/// Active 为唯一可变状态, 其余均为终态
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum PacketStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "revoked")]
    Revoked,
}

impl std::fmt::Display for PacketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketStatus::Active => write!(f, "active"),
            PacketStatus::Completed => write!(f, "completed"),
            PacketStatus::Expired => write!(f, "expired"),
            PacketStatus::Revoked => write!(f, "revoked"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePacketRequest {
    #[schema(example = 1001)]
    pub sender_id: i64,
    /// 总金额 (美分)
    #[schema(example = 10000)]
    pub total_amount: i64,
    /// 份数
    #[schema(example = 10)]
    pub total_count: i64,
    pub policy: PacketPolicy,
    /// 有效期 (秒), 缺省使用服务端配置
    pub ttl_seconds: Option<i64>,
    /// 发放的群/频道标识
    #[schema(example = "group-42")]
    pub context_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrabRequest {
    #[schema(example = 2002)]
    pub claimant_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeRequest {
    #[schema(example = 1001)]
    pub requester_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PacketResponse {
    pub packet_no: String,
    pub sender_id: i64,
    pub context_id: String,
    pub total_amount: i64,
    pub total_count: i64,
    pub remain_amount: i64,
    pub remain_count: i64,
    pub policy: PacketPolicy,
    pub status: PacketStatus,
    pub expire_time: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<red_packets::Model> for PacketResponse {
    fn from(packet: red_packets::Model) -> Self {
        Self {
            packet_no: packet.packet_no,
            sender_id: packet.sender_id,
            context_id: packet.context_id,
            total_amount: packet.total_amount,
            total_count: packet.total_count,
            remain_amount: packet.remain_amount,
            remain_count: packet.remain_count,
            policy: packet.policy,
            status: packet.status,
            expire_time: packet.expire_time,
            finished_at: packet.finished_at,
            created_at: packet.created_at,
        }
    }
}

/// 单次领取结果
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrabResponse {
    pub packet_no: String,
    /// 抢到的金额 (美分)
    pub amount: i64,
    /// 第几个领取 (1..total_count)
    pub claim_order: i64,
    /// 是否为手气最佳 (仅当本次领取让红包结束时才可能为 true)
    pub is_best_luck: bool,
    /// 本次领取是否领完了红包
    pub is_completed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeResponse {
    pub packet_no: String,
    /// 退回发送者的金额 (美分)
    pub refund_amount: i64,
    pub status: PacketStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimResponse {
    pub claimant_id: i64,
    pub amount: i64,
    pub claim_order: i64,
    pub is_best_luck: bool,
    pub created_at: DateTime<Utc>,
}

impl From<packet_claims::Model> for ClaimResponse {
    fn from(claim: packet_claims::Model) -> Self {
        Self {
            claimant_id: claim.claimant_id,
            amount: claim.amount,
            claim_order: claim.claim_order,
            is_best_luck: claim.is_best_luck,
            created_at: claim.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PacketDetailResponse {
    #[serde(flatten)]
    pub packet: PacketResponse,
    pub claims: Vec<ClaimResponse>,
}
