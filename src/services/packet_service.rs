use crate::config::PacketConfig;
use crate::entities::{packet_claim_entity as packet_claims, red_packet_entity as red_packets};
use crate::error::{AppError, AppResult};
use crate::external::{NotifierService, PacketEvent};
use crate::models::{
    CreatePacketRequest, GrabResponse, LedgerReason, PacketDetailResponse, PacketResponse,
    PacketStatus, RevokeResponse,
};
use crate::services::LedgerService;
use crate::utils::allocator;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

/// 红包生命周期 + 领取协调。
///
/// 同一红包上的 grab / revoke / expire 互斥: 每个操作开启事务后先对
/// 红包行加排它锁 (`SELECT ... FOR UPDATE`), 计数器、领取记录与余额
/// 变更全部落在同一事务内, 提交顺序即领取顺序。
#[derive(Clone)]
pub struct PacketService {
    pool: DatabaseConnection,
    ledger: LedgerService,
    notifier: NotifierService,
    min_share: i64,
    default_ttl_seconds: i64,
}

impl PacketService {
    pub fn new(
        pool: DatabaseConnection,
        ledger: LedgerService,
        notifier: NotifierService,
        config: &PacketConfig,
    ) -> Self {
        Self {
            pool,
            ledger,
            notifier,
            min_share: config.min_share_cents,
            default_ttl_seconds: config.default_ttl_seconds,
        }
    }

    /// 发红包:
    /// 1. 校验金额/份数 (不满足直接拒绝, 不开事务)
    /// 2. 同一事务内插入 Active 红包行并扣减发送者余额
    /// 3. 扣款失败整体回滚, 不会留下没有扣款的 Active 红包
    pub async fn create_packet(&self, request: CreatePacketRequest) -> AppResult<PacketResponse> {
        allocator::validate_split(request.total_amount, request.total_count, self.min_share)?;

        let ttl_seconds = request.ttl_seconds.unwrap_or(self.default_ttl_seconds);
        if ttl_seconds <= 0 {
            return Err(AppError::ValidationError(
                "ttl_seconds must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let packet = red_packets::ActiveModel {
            packet_no: Set(Uuid::new_v4().simple().to_string()),
            sender_id: Set(request.sender_id),
            context_id: Set(request.context_id.clone()),
            total_amount: Set(request.total_amount),
            total_count: Set(request.total_count),
            remain_amount: Set(request.total_amount),
            remain_count: Set(request.total_count),
            policy: Set(request.policy),
            status: Set(PacketStatus::Active),
            expire_time: Set(now + Duration::seconds(ttl_seconds)),
            finished_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        self.ledger
            .debit_tx(
                &txn,
                request.sender_id,
                request.total_amount,
                LedgerReason::PacketSend,
                Some(packet.id),
            )
            .await?;

        txn.commit().await?;

        self.notifier.notify(PacketEvent::Created {
            packet_no: packet.packet_no.clone(),
            sender_id: packet.sender_id,
            context_id: packet.context_id.clone(),
            total_amount: packet.total_amount,
            total_count: packet.total_count,
        });

        Ok(packet.into())
    }

    /// 抢红包。行锁内完成校验、抽份、计数器扣减、领取记录与入账。
    pub async fn grab(&self, packet_no: &str, claimant_id: i64) -> AppResult<GrabResponse> {
        let txn = self.pool.begin().await?;

        let packet = Self::lock_packet(&txn, packet_no)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Red packet {packet_no} not found")))?;

        // 已领完 (含状态漏标的修复): 领完优先于其它终态提示
        if packet.status == PacketStatus::Completed {
            return Err(AppError::PacketExhausted);
        }
        if packet.status == PacketStatus::Active && packet.remain_count == 0 {
            // 修复漏标状态后正常提交, 再报告已领完
            let now = Utc::now();
            let mut am = packet.into_active_model();
            am.status = Set(PacketStatus::Completed);
            am.finished_at = Set(Some(now));
            am.updated_at = Set(now);
            am.update(&txn).await?;
            txn.commit().await?;
            return Err(AppError::PacketExhausted);
        }
        if packet.status != PacketStatus::Active {
            return Err(AppError::PacketClosed);
        }

        let now = Utc::now();
        if now >= packet.expire_time {
            // 过期状态转移归扫描任务所有, 这里不改任何东西
            return Err(AppError::PacketExpired);
        }
        if claimant_id == packet.sender_id {
            return Err(AppError::SelfClaimForbidden);
        }

        let existing = packet_claims::Entity::find()
            .filter(packet_claims::Column::PacketId.eq(packet.id))
            .filter(packet_claims::Column::ClaimantId.eq(claimant_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::AlreadyClaimed);
        }

        let share = allocator::next_share(
            packet.remain_amount,
            packet.remain_count,
            packet.policy,
            self.min_share,
        )?;
        if share <= 0 || share > packet.remain_amount {
            return Err(AppError::InternalError(format!(
                "Allocated share {share} out of range for packet {packet_no}"
            )));
        }

        let new_remain_amount = packet.remain_amount - share;
        let new_remain_count = packet.remain_count - 1;
        let completed = new_remain_count == 0;
        if completed && new_remain_amount != 0 {
            return Err(AppError::InternalError(format!(
                "Final claim left {new_remain_amount} unassigned in packet {packet_no}"
            )));
        }
        let claim_order = packet.total_count - new_remain_count;

        let packet_id = packet.id;
        let packet_no_owned = packet.packet_no.clone();

        let mut am = packet.into_active_model();
        am.remain_amount = Set(new_remain_amount);
        am.remain_count = Set(new_remain_count);
        am.updated_at = Set(now);
        if completed {
            am.status = Set(PacketStatus::Completed);
            am.finished_at = Set(Some(now));
        }
        am.update(&txn).await?;

        // 唯一索引 (packet_id, claimant_id) 兜底上面的重复领取检查
        let claim = packet_claims::ActiveModel {
            packet_id: Set(packet_id),
            claimant_id: Set(claimant_id),
            amount: Set(share),
            claim_order: Set(claim_order),
            is_best_luck: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        self.ledger
            .credit_tx(
                &txn,
                claimant_id,
                share,
                LedgerReason::PacketReceive,
                Some(packet_id),
            )
            .await?;

        let mut is_best_luck = false;
        if completed {
            let best_id = Self::select_best_luck(&txn, packet_id).await?;
            is_best_luck = best_id == Some(claim.id);
        }

        txn.commit().await?;

        self.notifier.notify(PacketEvent::Claimed {
            packet_no: packet_no_owned.clone(),
            claimant_id,
            amount: share,
            claim_order,
        });
        if completed {
            self.notifier.notify(PacketEvent::Completed {
                packet_no: packet_no_owned.clone(),
            });
        }

        Ok(GrabResponse {
            packet_no: packet_no_owned,
            amount: share,
            claim_order,
            is_best_luck,
            is_completed: completed,
        })
    }

    /// 撤回红包。仅发送者可撤回, 仅 Active 状态可撤回。
    /// 剩余金额退回发送者, 已有人领取时评选手气最佳。
    pub async fn revoke(&self, packet_no: &str, requester_id: i64) -> AppResult<RevokeResponse> {
        let txn = self.pool.begin().await?;

        let packet = Self::lock_packet(&txn, packet_no)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Red packet {packet_no} not found")))?;

        if packet.status != PacketStatus::Active {
            return Err(AppError::NotActive);
        }
        if packet.sender_id != requester_id {
            return Err(AppError::NotOwner);
        }

        let packet_no_owned = packet.packet_no.clone();
        let refund_amount = self
            .finish_packet(&txn, packet, PacketStatus::Revoked)
            .await?;

        txn.commit().await?;

        self.notifier.notify(PacketEvent::Revoked {
            packet_no: packet_no_owned.clone(),
            refund_amount,
        });

        Ok(RevokeResponse {
            packet_no: packet_no_owned,
            refund_amount,
            status: PacketStatus::Revoked,
        })
    }

    /// 过期扫描。对每个到期红包单独开事务, 与迟到的 grab 用同一把
    /// 行锁互斥; 单个红包失败只记日志, 不影响其余。返回转移数量。
    pub async fn expire_sweep(&self) -> AppResult<u64> {
        let now = Utc::now();
        let due = red_packets::Entity::find()
            .filter(red_packets::Column::Status.eq(PacketStatus::Active))
            .filter(red_packets::Column::ExpireTime.lte(now))
            .all(&self.pool)
            .await?;

        let mut transitioned = 0u64;
        for packet in due {
            match self.expire_one(packet.id).await {
                Ok(Some(event)) => {
                    transitioned += 1;
                    self.notifier.notify(event);
                }
                Ok(None) => {} // 锁内复查后不再符合条件 (刚被抢完或撤回)
                Err(e) => {
                    log::error!("Failed to expire packet {}: {e:?}", packet.packet_no);
                }
            }
        }
        Ok(transitioned)
    }

    /// 查询红包快照与领取列表 (只读, 不加锁)
    pub async fn get_packet_state(&self, packet_no: &str) -> AppResult<PacketDetailResponse> {
        let packet = red_packets::Entity::find()
            .filter(red_packets::Column::PacketNo.eq(packet_no))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Red packet {packet_no} not found")))?;

        let claims = packet_claims::Entity::find()
            .filter(packet_claims::Column::PacketId.eq(packet.id))
            .order_by_asc(packet_claims::Column::ClaimOrder)
            .all(&self.pool)
            .await?;

        Ok(PacketDetailResponse {
            packet: packet.into(),
            claims: claims.into_iter().map(Into::into).collect(),
        })
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    /// 行锁 + 重读。所有红包变更路径必须经过这里拿锁。
    async fn lock_packet(
        txn: &DatabaseTransaction,
        packet_no: &str,
    ) -> AppResult<Option<red_packets::Model>> {
        let packet = red_packets::Entity::find()
            .filter(red_packets::Column::PacketNo.eq(packet_no))
            .lock_exclusive()
            .one(txn)
            .await?;
        Ok(packet)
    }

    /// 锁内复查后的过期转移。返回 None 表示复查未通过。
    async fn expire_one(&self, packet_row_id: i64) -> AppResult<Option<PacketEvent>> {
        let txn = self.pool.begin().await?;

        let packet = red_packets::Entity::find_by_id(packet_row_id)
            .lock_exclusive()
            .one(&txn)
            .await?;
        let Some(packet) = packet else {
            return Ok(None);
        };
        if packet.status != PacketStatus::Active || Utc::now() < packet.expire_time {
            return Ok(None);
        }

        let packet_no = packet.packet_no.clone();
        let refund_amount = self
            .finish_packet(&txn, packet, PacketStatus::Expired)
            .await?;
        txn.commit().await?;

        Ok(Some(PacketEvent::Expired {
            packet_no,
            refund_amount,
        }))
    }

    /// 终态转移共用路径 (Revoked / Expired):
    /// 状态落终态, 剩余金额退回发送者, 已有人领取时评选手气最佳。
    /// remain_amount 保持不动, 守恒式 total - remain == sum(claims) 始终成立。
    async fn finish_packet(
        &self,
        txn: &DatabaseTransaction,
        packet: red_packets::Model,
        target: PacketStatus,
    ) -> AppResult<i64> {
        let refund_amount = packet.remain_amount;
        let packet_id = packet.id;
        let sender_id = packet.sender_id;
        let has_claims = packet.remain_count < packet.total_count;
        let now = Utc::now();

        let mut am = packet.into_active_model();
        am.status = Set(target);
        am.finished_at = Set(Some(now));
        am.updated_at = Set(now);
        am.update(txn).await?;

        if refund_amount > 0 {
            self.ledger
                .credit_tx(
                    txn,
                    sender_id,
                    refund_amount,
                    LedgerReason::PacketRefund,
                    Some(packet_id),
                )
                .await?;
        }

        if has_claims {
            Self::select_best_luck(txn, packet_id).await?;
        }

        Ok(refund_amount)
    }

    /// 手气最佳: 金额最大者, 并列取领取顺序靠前者。
    /// 每个红包只标一次; 无人领取时不标。返回中选领取记录ID。
    async fn select_best_luck(
        txn: &DatabaseTransaction,
        packet_id: i64,
    ) -> AppResult<Option<i64>> {
        let existing = packet_claims::Entity::find()
            .filter(packet_claims::Column::PacketId.eq(packet_id))
            .filter(packet_claims::Column::IsBestLuck.eq(true))
            .one(txn)
            .await?;
        if let Some(existing) = existing {
            return Ok(Some(existing.id));
        }

        let best = packet_claims::Entity::find()
            .filter(packet_claims::Column::PacketId.eq(packet_id))
            .order_by_desc(packet_claims::Column::Amount)
            .order_by_asc(packet_claims::Column::ClaimOrder)
            .one(txn)
            .await?;
        let Some(best) = best else {
            return Ok(None);
        };

        let best_id = best.id;
        let mut am = best.into_active_model();
        am.is_best_luck = Set(true);
        am.update(txn).await?;
        Ok(Some(best_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NotifyConfig, PacketConfig};
    use crate::entities::{ledger_entry_entity as ledger_entries, user_entity as users};
    use crate::models::PacketPolicy;
    use migration::MigratorTrait;
    use sea_orm::{ConnectOptions, Database, PaginatorTrait};

    /// 单连接内存库: 事务只能串行执行, 与生产环境中行锁的
    /// 串行化效果一致
    async fn setup() -> (DatabaseConnection, PacketService) {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).sqlx_logging(false);
        let pool = Database::connect(options).await.unwrap();
        migration::Migrator::up(&pool, None).await.unwrap();

        let ledger = LedgerService::new(pool.clone());
        let notifier = NotifierService::new(NotifyConfig::default());
        let service = PacketService::new(pool.clone(), ledger, notifier, &PacketConfig::default());
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

    async fn balance_of(pool: &DatabaseConnection, id: i64) -> i64 {
        users::Entity::find_by_id(id)
            .one(pool)
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    fn create_request(
        sender_id: i64,
        total: i64,
        count: i64,
        policy: PacketPolicy,
    ) -> CreatePacketRequest {
        CreatePacketRequest {
            sender_id,
            total_amount: total,
            total_count: count,
            policy,
            ttl_seconds: Some(3600),
            context_id: "group-1".to_string(),
        }
    }

    /// 把红包的过期时间改到过去, 模拟超时
    async fn force_expire(pool: &DatabaseConnection, packet_no: &str) {
        let packet = red_packets::Entity::find()
            .filter(red_packets::Column::PacketNo.eq(packet_no))
            .one(pool)
            .await
            .unwrap()
            .unwrap();
        let mut am = packet.into_active_model();
        am.expire_time = Set(Utc::now() - Duration::hours(1));
        am.update(pool).await.unwrap();
    }

    /// 校验账户流水链: after == before + delta, 相邻记录首尾相接,
    /// 链尾等于账户当前余额
    async fn assert_ledger_chain(pool: &DatabaseConnection, user_id: i64) {
        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::UserId.eq(user_id))
            .order_by_asc(ledger_entries::Column::Id)
            .all(pool)
            .await
            .unwrap();
        let mut prev: Option<i64> = None;
        for entry in &entries {
            assert_eq!(entry.balance_after, entry.balance_before + entry.delta);
            if let Some(prev_after) = prev {
                assert_eq!(entry.balance_before, prev_after);
            }
            prev = Some(entry.balance_after);
        }
        if let Some(last_after) = prev {
            assert_eq!(balance_of(pool, user_id).await, last_after);
        }
    }

    #[tokio::test]
    async fn test_create_debits_sender_and_persists_active_packet() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 20_000).await;

        let packet = service
            .create_packet(create_request(1, 10_000, 10, PacketPolicy::Lucky))
            .await
            .unwrap();

        assert_eq!(packet.status, PacketStatus::Active);
        assert_eq!(packet.remain_amount, 10_000);
        assert_eq!(packet.remain_count, 10);
        assert_eq!(balance_of(&pool, 1).await, 10_000);
        assert_ledger_chain(&pool, 1).await;
    }

    #[tokio::test]
    async fn test_create_with_insufficient_balance_leaves_nothing() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 500).await;

        let err = service
            .create_packet(create_request(1, 10_000, 10, PacketPolicy::Lucky))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));

        // 整体回滚: 没有红包行, 没有流水, 余额不变
        assert_eq!(red_packets::Entity::find().count(&pool).await.unwrap(), 0);
        assert_eq!(ledger_entries::Entity::find().count(&pool).await.unwrap(), 0);
        assert_eq!(balance_of(&pool, 1).await, 500);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_parameters_before_any_transaction() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 20_000).await;

        let err = service
            .create_packet(create_request(1, 9, 10, PacketPolicy::Lucky))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(_)));

        let err = service
            .create_packet(create_request(1, 100, 0, PacketPolicy::Lucky))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCount(_)));

        assert_eq!(ledger_entries::Entity::find().count(&pool).await.unwrap(), 0);
        assert_eq!(balance_of(&pool, 1).await, 20_000);
    }

    #[tokio::test]
    async fn test_ten_claimants_drain_packet() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 10_000).await;

        let packet = service
            .create_packet(create_request(1, 10_000, 10, PacketPolicy::Lucky))
            .await
            .unwrap();

        let mut total_claimed = 0i64;
        for claimant in 2..=11i64 {
            let result = service.grab(&packet.packet_no, claimant).await.unwrap();
            assert_eq!(result.claim_order, claimant - 1);
            assert!(result.amount >= 1);
            assert_eq!(result.is_completed, claimant == 11);
            assert_eq!(balance_of(&pool, claimant).await, result.amount);
            total_claimed += result.amount;
        }
        assert_eq!(total_claimed, 10_000);

        let detail = service.get_packet_state(&packet.packet_no).await.unwrap();
        assert_eq!(detail.packet.status, PacketStatus::Completed);
        assert_eq!(detail.packet.remain_amount, 0);
        assert_eq!(detail.packet.remain_count, 0);
        assert!(detail.packet.finished_at.is_some());

        let orders: Vec<i64> = detail.claims.iter().map(|c| c.claim_order).collect();
        assert_eq!(orders, (1..=10i64).collect::<Vec<i64>>());
        assert_eq!(detail.claims.iter().map(|c| c.amount).sum::<i64>(), 10_000);

        // 手气最佳唯一, 且是金额最大者
        let best: Vec<_> = detail.claims.iter().filter(|c| c.is_best_luck).collect();
        assert_eq!(best.len(), 1);
        let max_amount = detail.claims.iter().map(|c| c.amount).max().unwrap();
        assert_eq!(best[0].amount, max_amount);

        for user_id in 1..=11i64 {
            assert_ledger_chain(&pool, user_id).await;
        }

        // 第 11 个来的人: 已领完
        let err = service.grab(&packet.packet_no, 99).await.unwrap_err();
        assert!(matches!(err, AppError::PacketExhausted));
    }

    #[tokio::test]
    async fn test_concurrent_grabs_serialize_on_packet_lock() {
        let (_pool, service) = setup().await;
        seed_user(&_pool, 1, 10_000).await;

        let packet = service
            .create_packet(create_request(1, 10_000, 10, PacketPolicy::Lucky))
            .await
            .unwrap();

        let mut set = tokio::task::JoinSet::new();
        for claimant in 2..=11i64 {
            let svc = service.clone();
            let packet_no = packet.packet_no.clone();
            set.spawn(async move { svc.grab(&packet_no, claimant).await });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            results.push(joined.unwrap().unwrap());
        }

        assert_eq!(results.len(), 10);
        let mut orders: Vec<i64> = results.iter().map(|r| r.claim_order).collect();
        orders.sort_unstable();
        assert_eq!(orders, (1..=10i64).collect::<Vec<i64>>());
        assert_eq!(results.iter().map(|r| r.amount).sum::<i64>(), 10_000);
        assert_eq!(results.iter().filter(|r| r.is_completed).count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_grab_credits_once() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 10_000).await;

        let packet = service
            .create_packet(create_request(1, 10_000, 5, PacketPolicy::Lucky))
            .await
            .unwrap();

        let first = service.grab(&packet.packet_no, 2).await.unwrap();
        let err = service.grab(&packet.packet_no, 2).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyClaimed));

        // 余额只入账一次
        assert_eq!(balance_of(&pool, 2).await, first.amount);
        let claim_count = packet_claims::Entity::find().count(&pool).await.unwrap();
        assert_eq!(claim_count, 1);
    }

    #[tokio::test]
    async fn test_single_share_packet_pays_full_amount() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 500).await;

        let packet = service
            .create_packet(create_request(1, 500, 1, PacketPolicy::Lucky))
            .await
            .unwrap();

        let result = service.grab(&packet.packet_no, 2).await.unwrap();
        assert_eq!(result.amount, 500);
        assert_eq!(result.claim_order, 1);
        assert!(result.is_completed);
        assert!(result.is_best_luck);
        assert_eq!(balance_of(&pool, 2).await, 500);
    }

    #[tokio::test]
    async fn test_sender_cannot_grab_own_packet() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 1_000).await;

        let packet = service
            .create_packet(create_request(1, 1_000, 2, PacketPolicy::Lucky))
            .await
            .unwrap();

        let err = service.grab(&packet.packet_no, 1).await.unwrap_err();
        assert!(matches!(err, AppError::SelfClaimForbidden));
        assert_eq!(balance_of(&pool, 1).await, 0);
    }

    #[tokio::test]
    async fn test_revoke_refunds_remainder_to_sender() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 9_000).await;

        let packet = service
            .create_packet(create_request(1, 9_000, 3, PacketPolicy::Equal))
            .await
            .unwrap();
        let first = service.grab(&packet.packet_no, 2).await.unwrap();
        assert_eq!(first.amount, 3_000);

        // 非发送者不能撤回
        let err = service.revoke(&packet.packet_no, 2).await.unwrap_err();
        assert!(matches!(err, AppError::NotOwner));

        let revoked = service.revoke(&packet.packet_no, 1).await.unwrap();
        assert_eq!(revoked.refund_amount, 6_000);
        assert_eq!(revoked.status, PacketStatus::Revoked);
        assert_eq!(balance_of(&pool, 1).await, 6_000);

        // 有人领过: 手气最佳已评出
        let detail = service.get_packet_state(&packet.packet_no).await.unwrap();
        assert_eq!(detail.claims.iter().filter(|c| c.is_best_luck).count(), 1);

        // 终态之后: 再撤回 NotActive, 再领取 PacketClosed
        let err = service.revoke(&packet.packet_no, 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotActive));
        let err = service.grab(&packet.packet_no, 3).await.unwrap_err();
        assert!(matches!(err, AppError::PacketClosed));

        assert_ledger_chain(&pool, 1).await;
        assert_ledger_chain(&pool, 2).await;
    }

    #[tokio::test]
    async fn test_expire_sweep_refunds_and_assigns_best_luck() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 10_000).await;

        let packet = service
            .create_packet(create_request(1, 10_000, 3, PacketPolicy::Equal))
            .await
            .unwrap();
        let first = service.grab(&packet.packet_no, 2).await.unwrap();
        let second = service.grab(&packet.packet_no, 3).await.unwrap();
        assert_eq!(first.amount, 3_333);
        assert_eq!(second.amount, 3_333);

        force_expire(&pool, &packet.packet_no).await;

        // 迟到的领取: 状态不动, 由扫描任务负责转移
        let err = service.grab(&packet.packet_no, 4).await.unwrap_err();
        assert!(matches!(err, AppError::PacketExpired));
        let detail = service.get_packet_state(&packet.packet_no).await.unwrap();
        assert_eq!(detail.packet.status, PacketStatus::Active);

        assert_eq!(service.expire_sweep().await.unwrap(), 1);

        let detail = service.get_packet_state(&packet.packet_no).await.unwrap();
        assert_eq!(detail.packet.status, PacketStatus::Expired);
        assert!(detail.packet.finished_at.is_some());
        // 剩余 3334 退回发送者
        assert_eq!(balance_of(&pool, 1).await, 3_334);
        // 金额并列时手气最佳取先领者
        let best = detail.claims.iter().find(|c| c.is_best_luck).unwrap();
        assert_eq!(best.claim_order, 1);

        // 没有遗留工作
        assert_eq!(service.expire_sweep().await.unwrap(), 0);
        let err = service.grab(&packet.packet_no, 5).await.unwrap_err();
        assert!(matches!(err, AppError::PacketClosed));
    }

    #[tokio::test]
    async fn test_expire_with_zero_claims_refunds_all_and_no_best_luck() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, 5_000).await;

        let packet = service
            .create_packet(create_request(1, 5_000, 5, PacketPolicy::Lucky))
            .await
            .unwrap();
        force_expire(&pool, &packet.packet_no).await;

        assert_eq!(service.expire_sweep().await.unwrap(), 1);

        let detail = service.get_packet_state(&packet.packet_no).await.unwrap();
        assert_eq!(detail.packet.status, PacketStatus::Expired);
        assert!(detail.claims.is_empty());
        assert_eq!(balance_of(&pool, 1).await, 5_000);
        assert_ledger_chain(&pool, 1).await;
    }

    #[tokio::test]
    async fn test_grab_unknown_packet_not_found() {
        let (_pool, service) = setup().await;
        let err = service.grab("no-such-packet", 2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
