use crate::models::{PacketPolicy, PacketStatus};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "red_packets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 对外红包编号 (uuid)
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
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
