use crate::entities::{ledger_entry_entity as ledger_entries, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{LedgerEntryResponse, LedgerReason, PageQuery, Paged, WalletResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// 账户余额与流水。
///
/// debit/credit 只在调用方已开启的事务里执行, 余额更新与流水追加
/// 共享同一个工作单元; 红包侧的回滚会连同这里的变更一起回滚。
#[derive(Clone)]
pub struct LedgerService {
    pool: DatabaseConnection,
}

impl LedgerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 扣款。账户不存在返回 NotFound, 余额不足返回 InsufficientBalance。
    /// 返回扣款后的余额。
    pub async fn debit_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: i64,
        reason: LedgerReason,
        packet_id: Option<i64>,
    ) -> AppResult<i64> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Debit amount must be positive".to_string(),
            ));
        }

        let user = users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {user_id} not found")))?;

        let balance_before = user.balance;
        if balance_before < amount {
            return Err(AppError::InsufficientBalance);
        }

        self.apply_tx(txn, user, -amount, reason, packet_id).await
    }

    /// 入账。账户不存在时以零余额懒创建 (领取人可能还没有钱包记录)。
    /// 返回入账后的余额。
    pub async fn credit_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: i64,
        reason: LedgerReason,
        packet_id: Option<i64>,
    ) -> AppResult<i64> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Credit amount must be positive".to_string(),
            ));
        }

        let user = self.ensure_account_tx(txn, user_id).await?;
        self.apply_tx(txn, user, amount, reason, packet_id).await
    }

    /// 查询钱包余额
    pub async fn get_wallet(&self, user_id: i64) -> AppResult<WalletResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {user_id} not found")))?;

        Ok(WalletResponse {
            user_id: user.id,
            balance: user.balance,
        })
    }

    /// 流水分页 (倒序)
    pub async fn list_entries(
        &self,
        user_id: i64,
        query: &PageQuery,
    ) -> AppResult<Paged<LedgerEntryResponse>> {
        let base = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::UserId.eq(user_id));

        let total = base.clone().count(&self.pool).await?;

        let items = base
            .order_by_desc(ledger_entries::Column::Id)
            .offset(query.offset())
            .limit(query.page_size())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(Paged::new(items, query, total))
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    async fn ensure_account_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> AppResult<users::Model> {
        if let Some(user) = users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(txn)
            .await?
        {
            return Ok(user);
        }
        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(user_id),
            balance: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;
        Ok(user)
    }

    /// 更新余额并追加一条流水。写入前校验链式不变量:
    /// 账户最后一条流水的 balance_after 必须等于本次的 balance_before。
    async fn apply_tx(
        &self,
        txn: &DatabaseTransaction,
        user: users::Model,
        delta: i64,
        reason: LedgerReason,
        packet_id: Option<i64>,
    ) -> AppResult<i64> {
        let user_id = user.id;
        let balance_before = user.balance;
        let balance_after = balance_before + delta;
        if balance_after < 0 {
            return Err(AppError::InternalError(format!(
                "Balance of account {user_id} would go negative"
            )));
        }

        let last = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::UserId.eq(user_id))
            .order_by_desc(ledger_entries::Column::Id)
            .one(txn)
            .await?;
        if let Some(last) = last
            && last.balance_after != balance_before
        {
            return Err(AppError::InternalError(format!(
                "Ledger chain broken for account {user_id}: last after={} current before={}",
                last.balance_after, balance_before
            )));
        }

        let mut am = user.into_active_model();
        am.balance = Set(balance_after);
        am.updated_at = Set(Utc::now());
        am.update(txn).await?;

        ledger_entries::ActiveModel {
            user_id: Set(user_id),
            delta: Set(delta),
            balance_before: Set(balance_before),
            balance_after: Set(balance_after),
            reason: Set(reason),
            packet_id: Set(packet_id),
            description: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        Ok(balance_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;
    use sea_orm::{ConnectOptions, Database, TransactionTrait};

    async fn setup() -> (DatabaseConnection, LedgerService) {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).sqlx_logging(false);
        let pool = Database::connect(options).await.unwrap();
        migration::Migrator::up(&pool, None).await.unwrap();
        let service = LedgerService::new(pool.clone());
        (pool, service)
    }

    async fn seed_user(pool: &DatabaseConnection, id: i64, balance: i64) {
        users::ActiveModel {
            id: Set(id),
            balance: Set(balance),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        }
        .insert(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_debit_then_credit_forms_consistent_chain() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 1_000).await;

        let txn = pool.begin().await.unwrap();
        let after_debit = service
            .debit_tx(&txn, 1, 400, LedgerReason::PacketSend, Some(7))
            .await
            .unwrap();
        assert_eq!(after_debit, 600);
        let after_credit = service
            .credit_tx(&txn, 1, 100, LedgerReason::PacketRefund, Some(7))
            .await
            .unwrap();
        assert_eq!(after_credit, 700);
        txn.commit().await.unwrap();

        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::UserId.eq(1))
            .order_by_asc(ledger_entries::Column::Id)
            .all(&pool)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            (entries[0].delta, entries[0].balance_before, entries[0].balance_after),
            (-400, 1_000, 600)
        );
        assert_eq!(
            (entries[1].delta, entries[1].balance_before, entries[1].balance_after),
            (100, 600, 700)
        );
        assert_eq!(entries[0].balance_after, entries[1].balance_before);

        let wallet = service.get_wallet(1).await.unwrap();
        assert_eq!(wallet.balance, 700);
    }

    #[tokio::test]
    async fn test_debit_insufficient_balance_rolls_back() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 100).await;

        let txn = pool.begin().await.unwrap();
        let err = service
            .debit_tx(&txn, 1, 200, LedgerReason::PacketSend, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));
        drop(txn); // 未提交, 回滚

        assert_eq!(service.get_wallet(1).await.unwrap().balance, 100);
        let entries = ledger_entries::Entity::find().all(&pool).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_debit_missing_account_not_found() {
        let (pool, service) = setup().await;
        let txn = pool.begin().await.unwrap();
        let err = service
            .debit_tx(&txn, 42, 100, LedgerReason::PacketSend, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_credit_lazily_creates_account() {
        let (pool, service) = setup().await;

        let txn = pool.begin().await.unwrap();
        let balance = service
            .credit_tx(&txn, 9, 250, LedgerReason::PacketReceive, Some(3))
            .await
            .unwrap();
        assert_eq!(balance, 250);
        txn.commit().await.unwrap();

        let wallet = service.get_wallet(9).await.unwrap();
        assert_eq!(wallet.balance, 250);
    }

    #[tokio::test]
    async fn test_list_entries_pages_in_reverse_order() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 0).await;

        for i in 1..=5i64 {
            let txn = pool.begin().await.unwrap();
            service
                .credit_tx(&txn, 1, i * 10, LedgerReason::PacketReceive, None)
                .await
                .unwrap();
            txn.commit().await.unwrap();
        }

        let query = PageQuery {
            page: Some(1),
            page_size: Some(2),
        };
        let page = service.list_entries(1, &query).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        // 倒序: 最新一条在前
        assert_eq!(page.items[0].delta, 50);
        assert_eq!(page.items[1].delta, 40);
    }
}
