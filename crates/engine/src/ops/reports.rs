use sea_orm::{EntityTrait, QueryOrder};

use crate::{
    Actor, EngineError, ResultEngine, StudentFee, View, fees,
    reports::{self, Summary},
};

use super::{Engine, TransactionListFilter, finance::matching_transactions, with_tx};

impl Engine {
    /// Aggregates the transactions matching `filter` together with the
    /// current fee totals. Cancelled transactions never count; a row in
    /// another currency fails the whole report with `CurrencyMismatch`.
    ///
    /// Authorization: roles with the reports view.
    pub async fn report_summary(
        &self,
        actor: &Actor,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Summary> {
        actor.role.require(View::Reports)?;
        // One read transaction so the transaction and fee totals agree.
        let (transactions, fees) = with_tx!(self, |db_tx| {
            let transactions = matching_transactions(&db_tx, filter).await?;
            let fees = fees::Entity::find()
                .order_by_asc(fees::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(StudentFee::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok((transactions, fees))
        })?;
        reports::summary(self.currency, &transactions, &fees)
    }

    /// Exports the transactions matching `filter` as CSV, oldest first.
    ///
    /// Authorization: roles with the reports view.
    pub async fn export_transactions_csv(
        &self,
        actor: &Actor,
        filter: &TransactionListFilter,
    ) -> ResultEngine<String> {
        actor.role.require(View::Reports)?;
        let transactions = matching_transactions(&self.database, filter).await?;
        let mut out = Vec::new();
        reports::write_transactions_csv(&mut out, &transactions)?;
        tracing::debug!(rows = transactions.len(), "transactions exported");
        String::from_utf8(out).map_err(|err| EngineError::Export(err.to_string()))
    }
}
