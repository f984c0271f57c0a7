use crate::models::LedgerReason;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 仅追加的余额流水。同一账户内相邻两条记录必须满足
/// `balance_after == 下一条.balance_before`。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    /// 变动金额 (美分, 带符号)
    pub delta: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub reason: LedgerReason,
    /// 关联红包行ID
    pub packet_id: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
