//! The module contains the `WalletBalance` snapshot and its storage model.
//!
//! There is at most one row per profile. Rows are only written by the
//! wallet operations of the engine, always together with a ledger entry in
//! `wallet_transactions`.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, util::{model_currency, parse_uuid}};

/// Prepaid balance of a profile, used for canteen and meal purchases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub profile_id: Uuid,
    pub balance_minor: i64,
    pub currency: Currency,
    /// `None` when the profile has never had a wallet movement.
    pub updated_at: Option<DateTime<Utc>>,
}

impl WalletBalance {
    /// Balance of a profile without a stored row.
    pub fn empty(profile_id: Uuid, currency: Currency) -> Self {
        Self {
            profile_id,
            balance_minor: 0,
            currency,
            updated_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "wallet_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub profile_id: String,
    pub balance_minor: i64,
    pub currency: String,
    pub updated_at: DateTimeUtc,
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

impl TryFrom<Model> for WalletBalance {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            profile_id: parse_uuid(&model.profile_id, "profile")?,
            balance_minor: model.balance_minor,
            currency: model_currency(&model.currency)?,
            updated_at: Some(model.updated_at),
        })
    }
}
