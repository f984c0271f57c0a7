use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "packet_claims")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub packet_id: i64,
    pub claimant_id: i64,
    /// 抢到的金额 (美分)
    pub amount: i64,
    /// 领取顺序 (1..total_count, 无空洞)
    pub claim_order: i64,
    pub is_best_luck: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
