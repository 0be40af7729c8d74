use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Actor, Currency, EngineError, ResultEngine, View, WalletBalance, WalletEntry,
    changes::{self, ChangeEvent, Table},
    util::{MAX_AMOUNT_MINOR, ensure_currency, ensure_positive, model_currency, normalize_optional},
    wallet_balances,
    wallet_transactions::{self, NewWalletEntry, replay},
};

use super::{Engine, clamp_limit, profiles::require_profile, with_tx};

/// Outcome of replaying a profile's wallet ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAudit {
    pub profile_id: Uuid,
    pub stored_minor: i64,
    pub replayed_minor: i64,
    pub entries: u64,
    pub consistent: bool,
}

pub(super) const WALLET_CHANGES: [ChangeEvent; 2] = [
    changes::update(Table::WalletBalances),
    changes::insert(Table::WalletTransactions),
];

/// A wallet movement about to be written.
pub(super) struct Movement<'a> {
    pub profile_id: Uuid,
    pub amount_minor: i64,
    pub currency: Currency,
    pub description: Option<&'a str>,
    pub financial_transaction_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

async fn stored_balance<C: ConnectionTrait>(
    db: &C,
    profile_id: Uuid,
) -> ResultEngine<Option<wallet_balances::Model>> {
    Ok(wallet_balances::Entity::find_by_id(profile_id.to_string())
        .one(db)
        .await?)
}

async fn append_entry<C: ConnectionTrait>(
    db: &C,
    movement: &Movement<'_>,
    signed_amount_minor: i64,
) -> ResultEngine<WalletEntry> {
    let row = stored_balance(db, movement.profile_id)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
    let entry = NewWalletEntry {
        profile_id: movement.profile_id,
        amount_minor: signed_amount_minor,
        balance_after_minor: row.balance_minor,
        currency: movement.currency,
        description: movement.description.map(ToString::to_string),
        financial_transaction_id: movement.financial_transaction_id,
        created_at: movement.at,
    };
    let model = wallet_transactions::ActiveModel::from(&entry).insert(db).await?;
    WalletEntry::try_from(model)
}

/// Adds money to a wallet, creating the balance row on first use.
pub(super) async fn credit<C: ConnectionTrait>(
    db: &C,
    movement: &Movement<'_>,
) -> ResultEngine<WalletEntry> {
    ensure_positive(movement.amount_minor)?;
    let profile_key = movement.profile_id.to_string();

    let updated = wallet_balances::Entity::update_many()
        .col_expr(
            wallet_balances::Column::BalanceMinor,
            Expr::col(wallet_balances::Column::BalanceMinor).add(movement.amount_minor),
        )
        .col_expr(wallet_balances::Column::UpdatedAt, Expr::value(movement.at))
        .filter(wallet_balances::Column::ProfileId.eq(profile_key.clone()))
        .filter(wallet_balances::Column::Currency.eq(movement.currency.code()))
        .filter(wallet_balances::Column::BalanceMinor.lte(MAX_AMOUNT_MINOR - movement.amount_minor))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        if let Some(existing) = stored_balance(db, movement.profile_id).await? {
            ensure_currency(movement.currency, model_currency(&existing.currency)?)?;
            return Err(EngineError::InvalidAmount(format!(
                "wallet balance would exceed {MAX_AMOUNT_MINOR}"
            )));
        }
        wallet_balances::ActiveModel {
            profile_id: ActiveValue::Set(profile_key),
            balance_minor: ActiveValue::Set(movement.amount_minor),
            currency: ActiveValue::Set(movement.currency.code().to_string()),
            updated_at: ActiveValue::Set(movement.at),
        }
        .insert(db)
        .await?;
    }

    append_entry(db, movement, movement.amount_minor).await
}

/// Removes money from a wallet if, and only if, the balance covers it.
///
/// The check and the deduction are one conditional `UPDATE`, so two
/// concurrent debits can never both pass against the same balance.
pub(super) async fn debit<C: ConnectionTrait>(
    db: &C,
    movement: &Movement<'_>,
) -> ResultEngine<WalletEntry> {
    ensure_positive(movement.amount_minor)?;

    let updated = wallet_balances::Entity::update_many()
        .col_expr(
            wallet_balances::Column::BalanceMinor,
            Expr::col(wallet_balances::Column::BalanceMinor).sub(movement.amount_minor),
        )
        .col_expr(wallet_balances::Column::UpdatedAt, Expr::value(movement.at))
        .filter(wallet_balances::Column::ProfileId.eq(movement.profile_id.to_string()))
        .filter(wallet_balances::Column::Currency.eq(movement.currency.code()))
        .filter(wallet_balances::Column::BalanceMinor.gte(movement.amount_minor))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        let available_minor = match stored_balance(db, movement.profile_id).await? {
            Some(existing) => {
                ensure_currency(movement.currency, model_currency(&existing.currency)?)?;
                existing.balance_minor
            }
            None => 0,
        };
        tracing::info!(
            profile_id = %movement.profile_id,
            available_minor,
            requested_minor = movement.amount_minor,
            "wallet debit rejected"
        );
        return Err(EngineError::InsufficientFunds {
            available_minor,
            requested_minor: movement.amount_minor,
        });
    }

    append_entry(db, movement, -movement.amount_minor).await
}

/// Wallets are readable by their owner and by staff with wallet access.
fn require_wallet_read(actor: &Actor, profile_id: Uuid) -> ResultEngine<()> {
    if actor.is(profile_id) {
        return Ok(());
    }
    require_wallet_staff(actor, View::Wallet)
}

fn require_wallet_staff(actor: &Actor, view: View) -> ResultEngine<()> {
    actor.role.require(view)?;
    if !actor.role.is_staff() {
        return Err(EngineError::Forbidden(
            "only staff can act on other wallets".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Current balance. A profile that never had a movement has a zero
    /// balance.
    pub async fn wallet_balance(&self, actor: &Actor, profile_id: Uuid) -> ResultEngine<WalletBalance> {
        require_wallet_read(actor, profile_id)?;
        require_profile(&self.database, profile_id).await?;
        match stored_balance(&self.database, profile_id).await? {
            Some(model) => {
                let balance = WalletBalance::try_from(model)?;
                ensure_currency(self.currency, balance.currency)?;
                Ok(balance)
            }
            None => Ok(WalletBalance::empty(profile_id, self.currency)),
        }
    }

    /// Credits a wallet (cash or card top-up at the office).
    ///
    /// Authorization: staff with wallet access.
    pub async fn top_up_wallet(
        &self,
        actor: &Actor,
        profile_id: Uuid,
        amount_minor: i64,
        description: Option<&str>,
    ) -> ResultEngine<WalletEntry> {
        require_wallet_staff(actor, View::Wallet)?;
        ensure_positive(amount_minor)?;
        let description = normalize_optional(description);

        let entry = with_tx!(self, |db_tx| {
            require_profile(&db_tx, profile_id).await?;
            let movement = Movement {
                profile_id,
                amount_minor,
                currency: self.currency,
                description: description.as_deref().or(Some("top-up")),
                financial_transaction_id: None,
                at: Utc::now(),
            };
            credit(&db_tx, &movement).await
        })?;

        self.publish(&WALLET_CHANGES);
        Ok(entry)
    }

    /// Debits a wallet for a canteen or meal purchase.
    ///
    /// Fails with [`EngineError::InsufficientFunds`] and leaves the balance
    /// untouched when it does not cover `amount_minor`.
    ///
    /// Authorization: staff with meal access.
    pub async fn debit_wallet(
        &self,
        actor: &Actor,
        profile_id: Uuid,
        amount_minor: i64,
        description: Option<&str>,
    ) -> ResultEngine<WalletEntry> {
        require_wallet_staff(actor, View::Meals)?;
        ensure_positive(amount_minor)?;
        let description = normalize_optional(description);

        let entry = with_tx!(self, |db_tx| {
            require_profile(&db_tx, profile_id).await?;
            let movement = Movement {
                profile_id,
                amount_minor,
                currency: self.currency,
                description: description.as_deref().or(Some("purchase")),
                financial_transaction_id: None,
                at: Utc::now(),
            };
            debit(&db_tx, &movement).await
        })?;

        self.publish(&WALLET_CHANGES);
        Ok(entry)
    }

    /// Ledger entries, newest first. `before_id` continues after the last
    /// entry of a previous page.
    pub async fn wallet_history(
        &self,
        actor: &Actor,
        profile_id: Uuid,
        limit: Option<u64>,
        before_id: Option<i64>,
    ) -> ResultEngine<Vec<WalletEntry>> {
        require_wallet_read(actor, profile_id)?;
        let mut query = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::ProfileId.eq(profile_id.to_string()));
        if let Some(before_id) = before_id {
            query = query.filter(wallet_transactions::Column::Id.lt(before_id));
        }
        query
            .order_by_desc(wallet_transactions::Column::Id)
            .limit(clamp_limit(limit))
            .all(&self.database)
            .await?
            .into_iter()
            .map(WalletEntry::try_from)
            .collect()
    }

    /// Replays the full ledger of a wallet and compares it with the stored
    /// balance.
    ///
    /// Authorization: staff with wallet access.
    pub async fn audit_wallet(&self, actor: &Actor, profile_id: Uuid) -> ResultEngine<WalletAudit> {
        require_wallet_staff(actor, View::Wallet)?;
        with_tx!(self, |db_tx| {
            require_profile(&db_tx, profile_id).await?;
            let stored_minor = stored_balance(&db_tx, profile_id)
                .await?
                .map_or(0, |model| model.balance_minor);
            let entries: Vec<WalletEntry> = wallet_transactions::Entity::find()
                .filter(wallet_transactions::Column::ProfileId.eq(profile_id.to_string()))
                .order_by_asc(wallet_transactions::Column::CreatedAt)
                .order_by_asc(wallet_transactions::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(WalletEntry::try_from)
                .collect::<ResultEngine<_>>()?;

            let replayed = replay(&entries);
            let replayed_minor = match &replayed {
                Ok(balance) => *balance,
                Err(_) => entries
                    .iter()
                    .fold(0_i64, |acc, entry| acc.saturating_add(entry.amount_minor)),
            };
            let consistent = replayed.is_ok() && replayed_minor == stored_minor;
            if !consistent {
                tracing::warn!(%profile_id, stored_minor, replayed_minor, "wallet ledger mismatch");
            }
            Ok(WalletAudit {
                profile_id,
                stored_minor,
                replayed_minor,
                entries: entries.len() as u64,
                consistent,
            })
        })
    }
}
