use sea_orm_migration::prelude::*;

use crate::m20260901_090000_profiles::Profiles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum WalletBalances {
    Table,
    ProfileId,
    BalanceMinor,
    Currency,
    UpdatedAt,
}

#[derive(Iden)]
pub enum WalletTransactions {
    Table,
    Id,
    ProfileId,
    AmountMinor,
    BalanceAfterMinor,
    Currency,
    Description,
    FinancialTransactionId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WalletBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletBalances::ProfileId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WalletBalances::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(WalletBalances::BalanceMinor).gte(0)),
                    )
                    .col(ColumnDef::new(WalletBalances::Currency).string().not_null())
                    .col(ColumnDef::new(WalletBalances::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_balances-profile_id")
                            .from(WalletBalances::Table, WalletBalances::ProfileId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Append-only ledger; the autoincrement id is the insertion sequence.
        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletTransactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::ProfileId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::BalanceAfterMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransactions::Description).string())
                    .col(ColumnDef::new(WalletTransactions::FinancialTransactionId).string())
                    .col(
                        ColumnDef::new(WalletTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transactions-profile_id")
                            .from(WalletTransactions::Table, WalletTransactions::ProfileId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-profile_id-created_at")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::ProfileId)
                    .col(WalletTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WalletTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletBalances::Table).to_owned())
            .await?;
        Ok(())
    }
}
