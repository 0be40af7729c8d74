//! Student fee assignments.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError,
    util::{model_currency, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    Unpaid,
    Partial,
    Paid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFee {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub title: String,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub currency: Currency,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl StudentFee {
    pub fn outstanding_minor(&self) -> i64 {
        self.amount_minor - self.paid_minor
    }

    pub fn status(&self) -> FeeStatus {
        if self.paid_minor == 0 {
            FeeStatus::Unpaid
        } else if self.paid_minor < self.amount_minor {
            FeeStatus::Partial
        } else {
            FeeStatus::Paid
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "student_fees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub profile_id: String,
    pub title: String,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub currency: String,
    pub due_date: Option<Date>,
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

impl From<&StudentFee> for ActiveModel {
    fn from(fee: &StudentFee) -> Self {
        Self {
            id: ActiveValue::Set(fee.id.to_string()),
            profile_id: ActiveValue::Set(fee.profile_id.to_string()),
            title: ActiveValue::Set(fee.title.clone()),
            amount_minor: ActiveValue::Set(fee.amount_minor),
            paid_minor: ActiveValue::Set(fee.paid_minor),
            currency: ActiveValue::Set(fee.currency.code().to_string()),
            due_date: ActiveValue::Set(fee.due_date),
            created_at: ActiveValue::Set(fee.created_at),
        }
    }
}

impl TryFrom<Model> for StudentFee {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "fee")?,
            profile_id: parse_uuid(&model.profile_id, "profile")?,
            title: model.title,
            amount_minor: model.amount_minor,
            paid_minor: model.paid_minor,
            currency: model_currency(&model.currency)?,
            due_date: model.due_date,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee(paid_minor: i64) -> StudentFee {
        StudentFee {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            title: "Term 1 tuition".to_string(),
            amount_minor: 150_000,
            paid_minor,
            currency: Currency::Omr,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_is_derived_from_paid_amount() {
        assert_eq!(fee(0).status(), FeeStatus::Unpaid);
        assert_eq!(fee(50_000).status(), FeeStatus::Partial);
        assert_eq!(fee(150_000).status(), FeeStatus::Paid);
        assert_eq!(fee(50_000).outstanding_minor(), 100_000);
    }
}
