use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Actor, AssignFeeCmd, EngineError, FinancialTransaction, ResultEngine, Role, StudentFee,
    TransactionKind, TransactionStatus, View,
    changes::{self, Table},
    fees,
    util::{ensure_currency, ensure_positive, normalize_required},
};

use super::{Engine, finance::insert_transaction, profiles::require_profile, with_tx};

/// Category of the income transaction written for every fee payment.
pub const FEES_CATEGORY: &str = "fees";

/// Result of a fee payment: the updated fee and the income it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePayment {
    pub fee: StudentFee,
    pub transaction: FinancialTransaction,
}

impl Engine {
    /// Assigns a fee to a student profile.
    ///
    /// Authorization: roles with the finance view.
    pub async fn assign_fee(&self, actor: &Actor, cmd: AssignFeeCmd) -> ResultEngine<StudentFee> {
        actor.role.require(View::Finance)?;
        ensure_positive(cmd.amount_minor)?;
        let fee = StudentFee {
            id: Uuid::new_v4(),
            profile_id: cmd.profile_id,
            title: normalize_required(&cmd.title, "fee title")?,
            amount_minor: cmd.amount_minor,
            paid_minor: 0,
            currency: self.currency,
            due_date: cmd.due_date,
            created_at: Utc::now(),
        };

        with_tx!(self, |db_tx| {
            let profile = require_profile(&db_tx, fee.profile_id).await?;
            if Role::try_from(profile.role.as_str())? != Role::Student {
                return Err(EngineError::Validation(
                    "fees can only be assigned to students".to_string(),
                ));
            }
            fees::ActiveModel::from(&fee).insert(&db_tx).await?;
            Ok(())
        })?;

        tracing::info!(fee_id = %fee.id, profile_id = %fee.profile_id, amount_minor = fee.amount_minor, "fee assigned");
        self.publish(&[changes::insert(Table::StudentFees)]);
        Ok(fee)
    }

    /// Records a payment against a fee.
    ///
    /// The amount must not exceed what is still outstanding. The fee update
    /// and the matching income transaction (category [`FEES_CATEGORY`]) are
    /// committed together.
    ///
    /// Authorization: roles with the finance view.
    pub async fn record_fee_payment(
        &self,
        actor: &Actor,
        fee_id: Uuid,
        amount_minor: i64,
    ) -> ResultEngine<FeePayment> {
        actor.role.require(View::Finance)?;
        ensure_positive(amount_minor)?;

        let payment = with_tx!(self, |db_tx| {
            let mut fee: StudentFee = fees::Entity::find_by_id(fee_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("fee not exists".to_string()))?
                .try_into()?;
            ensure_currency(self.currency, fee.currency)?;
            let outstanding_minor = fee.outstanding_minor();
            if amount_minor > outstanding_minor {
                return Err(EngineError::InvalidAmount(format!(
                    "payment of {amount_minor} exceeds outstanding {outstanding_minor}"
                )));
            }

            let updated = fees::Entity::update_many()
                .col_expr(
                    fees::Column::PaidMinor,
                    Expr::col(fees::Column::PaidMinor).add(amount_minor),
                )
                .filter(fees::Column::Id.eq(fee_id.to_string()))
                .filter(
                    Expr::expr(Expr::col(fees::Column::PaidMinor).add(amount_minor))
                        .lte(Expr::col(fees::Column::AmountMinor)),
                )
                .exec(&db_tx)
                .await?;
            if updated.rows_affected == 0 {
                return Err(EngineError::InvalidAmount(
                    "payment exceeds outstanding amount".to_string(),
                ));
            }
            fee.paid_minor += amount_minor;

            let now = Utc::now();
            let income = FinancialTransaction::new(
                TransactionKind::Income,
                FEES_CATEGORY.to_string(),
                amount_minor,
                fee.currency,
                Some(fee.profile_id),
                Some(fee.title.clone()),
                Vec::new(),
                TransactionStatus::Completed,
                actor.username.clone(),
                now,
                now,
            )?;
            let transaction = insert_transaction(&db_tx, income, false).await?;

            Ok(FeePayment { fee, transaction })
        })?;

        tracing::info!(
            %fee_id,
            amount_minor,
            outstanding_minor = payment.fee.outstanding_minor(),
            "fee payment recorded"
        );
        self.publish(&[
            changes::update(Table::StudentFees),
            changes::insert(Table::FinancialTransactions),
        ]);
        Ok(payment)
    }

    /// Lists fees, optionally for a single profile, earliest due first.
    ///
    /// Authorization: a student may list their own fees; everything else
    /// needs the fees view.
    pub async fn list_fees(
        &self,
        actor: &Actor,
        profile_id: Option<Uuid>,
    ) -> ResultEngine<Vec<StudentFee>> {
        match profile_id {
            Some(profile_id) if actor.is(profile_id) => {}
            _ => actor.role.require(View::Fees)?,
        }

        let mut query = fees::Entity::find();
        if let Some(profile_id) = profile_id {
            query = query.filter(fees::Column::ProfileId.eq(profile_id.to_string()));
        }
        query
            .order_by_asc(fees::Column::DueDate)
            .order_by_asc(fees::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(StudentFee::try_from)
            .collect()
    }
}
