use sea_orm_migration::prelude::*;

use crate::{
    m20260901_090000_profiles::Profiles, m20260901_100000_wallets::WalletTransactions,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum FinancialTransactions {
    Table,
    Id,
    Kind,
    Category,
    AmountMinor,
    Currency,
    ProfileId,
    Description,
    Documents,
    Status,
    CreatedBy,
    OccurredAt,
    CreatedAt,
    WalletTransactionId,
}

#[derive(Iden)]
enum StudentFees {
    Table,
    Id,
    ProfileId,
    Title,
    AmountMinor,
    PaidMinor,
    Currency,
    DueDate,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FinancialTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinancialTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(FinancialTransactions::Category)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinancialTransactions::ProfileId).string())
                    .col(ColumnDef::new(FinancialTransactions::Description).string())
                    .col(
                        ColumnDef::new(FinancialTransactions::Documents)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(FinancialTransactions::Status).string().not_null())
                    .col(
                        ColumnDef::new(FinancialTransactions::CreatedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinancialTransactions::WalletTransactionId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-financial_transactions-profile_id")
                            .from(FinancialTransactions::Table, FinancialTransactions::ProfileId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-financial_transactions-wallet_transaction_id")
                            .from(
                                FinancialTransactions::Table,
                                FinancialTransactions::WalletTransactionId,
                            )
                            .to(WalletTransactions::Table, WalletTransactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-financial_transactions-occurred_at")
                    .table(FinancialTransactions::Table)
                    .col(FinancialTransactions::OccurredAt)
                    .col(FinancialTransactions::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-financial_transactions-profile_id")
                    .table(FinancialTransactions::Table)
                    .col(FinancialTransactions::ProfileId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StudentFees::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StudentFees::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(StudentFees::ProfileId).string().not_null())
                    .col(ColumnDef::new(StudentFees::Title).string().not_null())
                    .col(ColumnDef::new(StudentFees::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(StudentFees::PaidMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(StudentFees::Currency).string().not_null())
                    .col(ColumnDef::new(StudentFees::DueDate).date())
                    .col(ColumnDef::new(StudentFees::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_fees-profile_id")
                            .from(StudentFees::Table, StudentFees::ProfileId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-student_fees-profile_id")
                    .table(StudentFees::Table)
                    .col(StudentFees::ProfileId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StudentFees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FinancialTransactions::Table).to_owned())
            .await?;
        Ok(())
    }
}
