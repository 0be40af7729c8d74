use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, Select, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Actor, EngineError, FinancialTransaction, RecordTransactionCmd, ResultEngine,
    TransactionKind, TransactionStatus, View,
    changes::{self, Table},
    financial_transactions,
    util::{ensure_currency, normalize_optional, normalize_required, normalize_text},
};

use super::{
    Engine, PageCursor, clamp_limit,
    profiles::require_profile,
    wallets::{self, Movement, WALLET_CHANGES},
    with_tx,
};

/// Optional filters for listing and exporting financial transactions.
///
/// `from` is inclusive, `to` exclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionListFilter {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub profile_id: Option<Uuid>,
    pub category: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TransactionListFilter {
    fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from >= to
        {
            return Err(EngineError::Validation(
                "`from` must be earlier than `to`".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(
        &self,
        mut query: Select<financial_transactions::Entity>,
    ) -> Select<financial_transactions::Entity> {
        if let Some(kind) = self.kind {
            query = query.filter(financial_transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(status) = self.status {
            query = query.filter(financial_transactions::Column::Status.eq(status.as_str()));
        }
        if let Some(profile_id) = self.profile_id {
            query = query
                .filter(financial_transactions::Column::ProfileId.eq(profile_id.to_string()));
        }
        if let Some(category) = self.category.as_deref() {
            query = query
                .filter(financial_transactions::Column::Category.eq(category_key(category)));
        }
        if let Some(from) = self.from {
            query = query.filter(financial_transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = self.to {
            query = query.filter(financial_transactions::Column::OccurredAt.lt(to));
        }
        query
    }
}

/// Categories are stored in this form, so filtering is an exact match that
/// folds case for any script.
fn category_key(value: &str) -> String {
    normalize_text(value).to_lowercase()
}

/// One page of transactions, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<FinancialTransaction>,
    /// Pass back as `cursor` to fetch the next (older) page.
    pub next_cursor: Option<String>,
}

async fn require_transaction<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> ResultEngine<FinancialTransaction> {
    let model = financial_transactions::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
    FinancialTransaction::try_from(model)
}

/// Every transaction matching `filter`, oldest first.
pub(super) async fn matching_transactions<C: ConnectionTrait>(
    db: &C,
    filter: &TransactionListFilter,
) -> ResultEngine<Vec<FinancialTransaction>> {
    filter.validate()?;
    filter
        .apply(financial_transactions::Entity::find())
        .order_by_asc(financial_transactions::Column::OccurredAt)
        .order_by_asc(financial_transactions::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(FinancialTransaction::try_from)
        .collect()
}

/// Inserts an already validated transaction, charging the linked wallet
/// first when `charge_wallet` is set. Must run inside a DB transaction.
pub(super) async fn insert_transaction<C: ConnectionTrait>(
    db: &C,
    mut record: FinancialTransaction,
    charge_wallet: bool,
) -> ResultEngine<FinancialTransaction> {
    if let Some(profile_id) = record.profile_id {
        require_profile(db, profile_id).await?;
    }
    if charge_wallet {
        let profile_id = record.profile_id.ok_or_else(|| {
            EngineError::Validation("charging a wallet needs a profile".to_string())
        })?;
        let description = record
            .description
            .clone()
            .unwrap_or_else(|| record.category.clone());
        let entry = wallets::debit(
            db,
            &Movement {
                profile_id,
                amount_minor: record.amount_minor,
                currency: record.currency,
                description: Some(&description),
                financial_transaction_id: Some(record.id),
                at: record.created_at,
            },
        )
        .await?;
        record.wallet_transaction_id = Some(entry.id);
    }
    financial_transactions::ActiveModel::try_from(&record)?
        .insert(db)
        .await?;
    Ok(record)
}

impl Engine {
    /// Records an income or expense. The category is stored trimmed and
    /// lowercased.
    ///
    /// When the command charges a wallet, the conditional debit, the ledger
    /// entry and the financial record are written in one DB transaction: an
    /// insufficient balance leaves no trace at all.
    ///
    /// Authorization: roles with the finance view.
    pub async fn record_transaction(
        &self,
        actor: &Actor,
        cmd: RecordTransactionCmd,
    ) -> ResultEngine<FinancialTransaction> {
        actor.role.require(View::Finance)?;
        if cmd.charge_wallet && cmd.kind != TransactionKind::Expense {
            return Err(EngineError::Validation(
                "only expenses can charge a wallet".to_string(),
            ));
        }
        let documents = cmd
            .documents
            .iter()
            .map(|url| normalize_text(url))
            .filter(|url| !url.is_empty())
            .collect();
        let record = FinancialTransaction::new(
            cmd.kind,
            category_key(&normalize_required(&cmd.category, "category")?),
            cmd.amount_minor,
            self.currency,
            cmd.profile_id,
            normalize_optional(cmd.description.as_deref()),
            documents,
            cmd.status,
            actor.username.clone(),
            cmd.occurred_at,
            Utc::now(),
        )?;

        let record = with_tx!(self, |db_tx| {
            insert_transaction(&db_tx, record, cmd.charge_wallet).await
        })?;

        tracing::info!(
            transaction_id = %record.id,
            kind = record.kind.as_str(),
            amount_minor = record.amount_minor,
            wallet_charged = record.wallet_transaction_id.is_some(),
            "financial transaction recorded"
        );
        self.publish(&[changes::insert(Table::FinancialTransactions)]);
        if record.wallet_transaction_id.is_some() {
            self.publish(&WALLET_CHANGES);
        }
        Ok(record)
    }

    /// Moves a transaction to a new status.
    ///
    /// Cancelling a transaction that charged a wallet credits the amount
    /// back with a new ledger entry in the same DB transaction.
    ///
    /// Authorization: roles with the finance view.
    pub async fn set_transaction_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: TransactionStatus,
    ) -> ResultEngine<FinancialTransaction> {
        actor.role.require(View::Finance)?;

        let (record, refunded) = with_tx!(self, |db_tx| {
            let mut record = require_transaction(&db_tx, id).await?;
            ensure_currency(self.currency, record.currency)?;
            if !record.status.can_become(status) {
                return Err(EngineError::InvalidStatus(format!(
                    "cannot move a {} transaction to {}",
                    record.status.as_str(),
                    status.as_str()
                )));
            }

            let updated = financial_transactions::Entity::update_many()
                .col_expr(
                    financial_transactions::Column::Status,
                    Expr::value(status.as_str()),
                )
                .filter(financial_transactions::Column::Id.eq(id.to_string()))
                .filter(financial_transactions::Column::Status.eq(record.status.as_str()))
                .exec(&db_tx)
                .await?;
            if updated.rows_affected == 0 {
                return Err(EngineError::InvalidStatus(
                    "transaction status changed concurrently".to_string(),
                ));
            }

            let mut refunded = false;
            if status == TransactionStatus::Cancelled
                && record.wallet_transaction_id.is_some()
                && let Some(profile_id) = record.profile_id
            {
                let description = format!("refund: {}", record.category);
                wallets::credit(
                    &db_tx,
                    &Movement {
                        profile_id,
                        amount_minor: record.amount_minor,
                        currency: record.currency,
                        description: Some(&description),
                        financial_transaction_id: Some(record.id),
                        at: Utc::now(),
                    },
                )
                .await?;
                refunded = true;
            }

            record.status = status;
            Ok((record, refunded))
        })?;

        tracing::info!(transaction_id = %id, status = status.as_str(), refunded, "transaction status changed");
        self.publish(&[changes::update(Table::FinancialTransactions)]);
        if refunded {
            self.publish(&WALLET_CHANGES);
        }
        Ok(record)
    }

    /// Returns a single transaction.
    pub async fn financial_transaction(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> ResultEngine<FinancialTransaction> {
        actor.role.require(View::Transactions)?;
        let record = require_transaction(&self.database, id).await?;
        ensure_currency(self.currency, record.currency)?;
        Ok(record)
    }

    /// Lists transactions newest → older by `(occurred_at DESC, id DESC)`.
    ///
    /// `cursor` is the `next_cursor` of the previous page.
    pub async fn list_transactions(
        &self,
        actor: &Actor,
        filter: &TransactionListFilter,
        limit: Option<u64>,
        cursor: Option<&str>,
    ) -> ResultEngine<TransactionPage> {
        actor.role.require(View::Transactions)?;
        filter.validate()?;
        let limit = clamp_limit(limit);

        let mut query = filter.apply(financial_transactions::Entity::find());
        if let Some(cursor) = cursor {
            let cursor = PageCursor::decode(cursor)?;
            query = query.filter(
                Condition::any()
                    .add(financial_transactions::Column::OccurredAt.lt(cursor.at))
                    .add(
                        Condition::all()
                            .add(financial_transactions::Column::OccurredAt.eq(cursor.at))
                            .add(financial_transactions::Column::Id.lt(cursor.id)),
                    ),
            );
        }
        let models = query
            .order_by_desc(financial_transactions::Column::OccurredAt)
            .order_by_desc(financial_transactions::Column::Id)
            .limit(limit.saturating_add(1))
            .all(&self.database)
            .await?;

        let has_more = models.len() > limit as usize;
        let transactions = models
            .into_iter()
            .take(limit as usize)
            .map(FinancialTransaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let next_cursor = if has_more {
            transactions
                .last()
                .map(|tx| PageCursor {
                    at: tx.occurred_at,
                    id: tx.id.to_string(),
                })
                .map(|cursor| cursor.encode())
                .transpose()?
        } else {
            None
        };

        Ok(TransactionPage {
            transactions,
            next_cursor,
        })
    }
}
