use sea_orm_migration::prelude::*;

/// Users (账户表，余额以美分存储)
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Balance,
    CreatedAt,
    UpdatedAt,
}

/// Red Packets (红包表)
#[derive(DeriveIden)]
enum RedPackets {
    Table,
    Id,
    PacketNo,
    SenderId,
    ContextId,
    TotalAmount,
    TotalCount,
    RemainAmount,
    RemainCount,
    Policy,
    Status,
    ExpireTime,
    FinishedAt,
    CreatedAt,
    UpdatedAt,
}

/// Packet Claims (领取记录表)
#[derive(DeriveIden)]
enum PacketClaims {
    Table,
    Id,
    PacketId,
    ClaimantId,
    Amount,
    ClaimOrder,
    IsBestLuck,
    CreatedAt,
}

/// Ledger Entries (余额流水表, 仅追加)
#[derive(DeriveIden)]
enum LedgerEntries {
    Table,
    Id,
    UserId,
    Delta,
    BalanceBefore,
    BalanceAfter,
    Reason,
    PacketId,
    Description,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 金额字段统一使用 big_integer (美分)。
/// 枚举列存 snake_case 字符串:
/// - policy: lucky / equal
/// - status: active / completed / expired / revoked
/// - reason: packet_send / packet_receive / packet_refund
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 账户表 (id 由外部账户体系分配, 不自增)
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 红包表
        manager
            .create_table(
                Table::create()
                    .table(RedPackets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RedPackets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::PacketNo)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::SenderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::ContextId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::TotalCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::RemainAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::RemainCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RedPackets::Policy).string_len(16).not_null())
                    .col(ColumnDef::new(RedPackets::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(RedPackets::ExpireTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RedPackets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RedPackets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 对外红包编号唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_red_packets_packet_no_unique")
                    .table(RedPackets::Table)
                    .col(RedPackets::PacketNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 过期扫描使用 (status, expire_time)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_red_packets_status_expire")
                    .table(RedPackets::Table)
                    .col(RedPackets::Status)
                    .col(RedPackets::ExpireTime)
                    .to_owned(),
            )
            .await?;

        // 领取记录表
        manager
            .create_table(
                Table::create()
                    .table(PacketClaims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PacketClaims::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PacketClaims::PacketId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PacketClaims::ClaimantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PacketClaims::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PacketClaims::ClaimOrder)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PacketClaims::IsBestLuck)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PacketClaims::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个用户对同一红包只能领取一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_packet_claims_packet_claimant_unique")
                    .table(PacketClaims::Table)
                    .col(PacketClaims::PacketId)
                    .col(PacketClaims::ClaimantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_packet_claims_packet_order")
                    .table(PacketClaims::Table)
                    .col(PacketClaims::PacketId)
                    .col(PacketClaims::ClaimOrder)
                    .to_owned(),
            )
            .await?;

        // 余额流水表
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Delta)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::BalanceBefore)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Reason)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::PacketId).big_integer().null())
                    .col(
                        ColumnDef::new(LedgerEntries::Description)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 按账户回放流水
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ledger_entries_user_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::UserId)
                    .col(LedgerEntries::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PacketClaims::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RedPackets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
