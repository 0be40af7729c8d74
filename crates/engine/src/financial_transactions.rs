//! School-level income/expense records.
//!
//! A `FinancialTransaction` is independent from the wallet ledger, except
//! when an expense charges a profile's wallet: then `wallet_transaction_id`
//! points at the mirroring ledger entry. Records are immutable once created,
//! except for their status.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine,
    util::{ensure_positive, model_currency, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Allowed moves: `pending → completed | cancelled`, `completed → cancelled`.
    pub fn can_become(self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Completed, Self::Cancelled)
        )
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTransaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub category: String,
    /// Always > 0; `kind` gives the direction.
    pub amount_minor: i64,
    pub currency: Currency,
    pub profile_id: Option<Uuid>,
    pub description: Option<String>,
    /// URLs of uploaded supporting documents.
    pub documents: Vec<String>,
    pub status: TransactionStatus,
    pub created_by: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub wallet_transaction_id: Option<i64>,
}

impl FinancialTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: TransactionKind,
        category: String,
        amount_minor: i64,
        currency: Currency,
        profile_id: Option<Uuid>,
        description: Option<String>,
        documents: Vec<String>,
        status: TransactionStatus,
        created_by: String,
        occurred_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive(amount_minor)?;
        if status == TransactionStatus::Cancelled {
            return Err(EngineError::InvalidStatus(
                "a transaction cannot be created cancelled".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            category,
            amount_minor,
            currency,
            profile_id,
            description,
            documents,
            status,
            created_by,
            occurred_at,
            created_at,
            wallet_transaction_id: None,
        })
    }

    /// Amount with the sign of its effect on the school's books.
    pub fn signed_amount_minor(&self) -> i64 {
        match self.kind {
            TransactionKind::Income => self.amount_minor,
            TransactionKind::Expense => -self.amount_minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "financial_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub category: String,
    pub amount_minor: i64,
    pub currency: String,
    pub profile_id: Option<String>,
    pub description: Option<String>,
    /// JSON array of document URLs.
    pub documents: String,
    pub status: String,
    pub created_by: String,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub wallet_transaction_id: Option<i64>,
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

impl TryFrom<&FinancialTransaction> for ActiveModel {
    type Error = EngineError;

    fn try_from(tx: &FinancialTransaction) -> Result<Self, Self::Error> {
        let documents = serde_json::to_string(&tx.documents)
            .map_err(|err| EngineError::Validation(format!("invalid documents: {err}")))?;
        Ok(Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            category: ActiveValue::Set(tx.category.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            profile_id: ActiveValue::Set(tx.profile_id.map(|id| id.to_string())),
            description: ActiveValue::Set(tx.description.clone()),
            documents: ActiveValue::Set(documents),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            created_at: ActiveValue::Set(tx.created_at),
            wallet_transaction_id: ActiveValue::Set(tx.wallet_transaction_id),
        })
    }
}

impl TryFrom<Model> for FinancialTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let documents: Vec<String> = serde_json::from_str(&model.documents)
            .map_err(|err| EngineError::Validation(format!("invalid documents: {err}")))?;
        Ok(Self {
            id: parse_uuid(&model.id, "financial transaction")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            category: model.category,
            amount_minor: model.amount_minor,
            currency: model_currency(&model.currency)?,
            profile_id: model
                .profile_id
                .as_deref()
                .map(|id| parse_uuid(id, "profile"))
                .transpose()?,
            description: model.description,
            documents,
            status: TransactionStatus::try_from(model.status.as_str())?,
            created_by: model.created_by,
            occurred_at: model.occurred_at,
            created_at: model.created_at,
            wallet_transaction_id: model.wallet_transaction_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        use TransactionStatus::*;
        assert!(Pending.can_become(Completed));
        assert!(Pending.can_become(Cancelled));
        assert!(Completed.can_become(Cancelled));
        assert!(!Completed.can_become(Pending));
        assert!(!Cancelled.can_become(Completed));
        assert!(!Cancelled.can_become(Cancelled));
    }

    #[test]
    fn new_rejects_non_positive_amounts_and_cancelled_status() {
        let now = Utc::now();
        let build = |amount, status| {
            FinancialTransaction::new(
                TransactionKind::Expense,
                "supplies".to_string(),
                amount,
                Currency::Omr,
                None,
                None,
                Vec::new(),
                status,
                "admin".to_string(),
                now,
                now,
            )
        };
        assert!(build(0, TransactionStatus::Completed).is_err());
        assert!(build(-5, TransactionStatus::Completed).is_err());
        assert!(matches!(
            build(i64::MAX, TransactionStatus::Completed),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(build(crate::MAX_AMOUNT_MINOR, TransactionStatus::Completed).is_ok());
        assert!(matches!(
            build(5, TransactionStatus::Cancelled),
            Err(EngineError::InvalidStatus(_))
        ));
        assert_eq!(build(5, TransactionStatus::Pending).unwrap().signed_amount_minor(), -5);
    }
}
