//! Wallet ledger entries.
//!
//! Entries are append-only. For every profile, summing `amount_minor` in
//! `(created_at, id)` order yields the stored wallet balance, and each
//! entry's `balance_after_minor` is the running total at that point.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, util::{model_currency, parse_uuid}};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    /// Insertion sequence, increasing with every entry.
    pub id: i64,
    pub profile_id: Uuid,
    /// Signed change: positive for top-ups and refunds, negative for debits.
    pub amount_minor: i64,
    pub balance_after_minor: i64,
    pub currency: Currency,
    pub description: Option<String>,
    /// Set when the movement was caused by a financial transaction.
    pub financial_transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Fields of a ledger entry before the database assigns its id.
#[derive(Clone, Debug)]
pub(crate) struct NewWalletEntry {
    pub profile_id: Uuid,
    pub amount_minor: i64,
    pub balance_after_minor: i64,
    pub currency: Currency,
    pub description: Option<String>,
    pub financial_transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub profile_id: String,
    pub amount_minor: i64,
    pub balance_after_minor: i64,
    pub currency: String,
    pub description: Option<String>,
    pub financial_transaction_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::ProfileId",
        to = "super::profiles::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Profiles,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewWalletEntry> for ActiveModel {
    fn from(entry: &NewWalletEntry) -> Self {
        Self {
            id: ActiveValue::NotSet,
            profile_id: ActiveValue::Set(entry.profile_id.to_string()),
            amount_minor: ActiveValue::Set(entry.amount_minor),
            balance_after_minor: ActiveValue::Set(entry.balance_after_minor),
            currency: ActiveValue::Set(entry.currency.code().to_string()),
            description: ActiveValue::Set(entry.description.clone()),
            financial_transaction_id: ActiveValue::Set(
                entry.financial_transaction_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for WalletEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            profile_id: parse_uuid(&model.profile_id, "profile")?,
            amount_minor: model.amount_minor,
            balance_after_minor: model.balance_after_minor,
            currency: model_currency(&model.currency)?,
            description: model.description,
            financial_transaction_id: model
                .financial_transaction_id
                .as_deref()
                .map(|id| parse_uuid(id, "financial transaction"))
                .transpose()?,
            created_at: model.created_at,
        })
    }
}

/// Replays entries (already in ledger order) and returns the final balance.
///
/// Fails when an entry's `balance_after_minor` disagrees with the running
/// total, which means the ledger was written outside the engine.
pub fn replay(entries: &[WalletEntry]) -> Result<i64, EngineError> {
    let mut balance = 0i64;
    for entry in entries {
        balance = balance
            .checked_add(entry.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("ledger overflow".to_string()))?;
        if balance != entry.balance_after_minor {
            return Err(EngineError::InvalidAmount(format!(
                "ledger entry {} records balance {} but replay gives {balance}",
                entry.id, entry.balance_after_minor
            )));
        }
    }
    Ok(balance)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn entry(id: i64, amount_minor: i64, balance_after_minor: i64) -> WalletEntry {
        WalletEntry {
            id,
            profile_id: Uuid::nil(),
            amount_minor,
            balance_after_minor,
            currency: Currency::Omr,
            description: None,
            financial_transaction_id: None,
            created_at: Utc.timestamp_opt(id, 0).unwrap(),
        }
    }

    #[test]
    fn replay_sums_entries() {
        let entries = [entry(1, 100_000, 100_000), entry(2, -40_000, 60_000), entry(3, 5_000, 65_000)];
        assert_eq!(replay(&entries).unwrap(), 65_000);
        assert_eq!(replay(&[]).unwrap(), 0);
    }

    #[test]
    fn replay_detects_inconsistent_running_balance() {
        let entries = [entry(1, 100_000, 100_000), entry(2, -40_000, 70_000)];
        assert!(matches!(replay(&entries), Err(EngineError::InvalidAmount(_))));
    }
}
