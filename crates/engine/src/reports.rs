//! Report aggregation over financial transactions and fees.
//!
//! Every fold here is a plain pass over an in-memory slice; callers load the
//! rows and call these again on every refresh. Sums are checked: a total
//! outside `i64` is an `InvalidAmount` error.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::{
    Currency, EngineError, FinancialTransaction, Money, ResultEngine, StudentFee,
    TransactionKind, TransactionStatus, util::ensure_currency,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub revenue_minor: i64,
    pub expenses_minor: i64,
    pub net_minor: i64,
}

fn overflow() -> EngineError {
    EngineError::InvalidAmount("report total out of range".to_string())
}

fn checked_add(acc: i64, amount_minor: i64) -> ResultEngine<i64> {
    acc.checked_add(amount_minor).ok_or_else(overflow)
}

impl Totals {
    fn add(&mut self, tx: &FinancialTransaction) -> ResultEngine<()> {
        match tx.kind {
            TransactionKind::Income => {
                self.revenue_minor = checked_add(self.revenue_minor, tx.amount_minor)?
            }
            TransactionKind::Expense => {
                self.expenses_minor = checked_add(self.expenses_minor, tx.amount_minor)?
            }
        }
        self.net_minor = self
            .revenue_minor
            .checked_sub(self.expenses_minor)
            .ok_or_else(overflow)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTotals {
    pub due_minor: i64,
    pub paid_minor: i64,
    pub outstanding_minor: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub currency: Currency,
    pub totals: Totals,
    pub by_category: BTreeMap<String, Totals>,
    /// Keyed by `YYYY-MM` of `occurred_at` (UTC).
    pub by_month: BTreeMap<String, Totals>,
    pub fees: FeeTotals,
}

fn counted(tx: &FinancialTransaction) -> bool {
    tx.status != TransactionStatus::Cancelled
}

/// Revenue, expenses and net over all non-cancelled transactions.
pub fn totals(transactions: &[FinancialTransaction]) -> ResultEngine<Totals> {
    let mut acc = Totals::default();
    for tx in transactions.iter().filter(|tx| counted(tx)) {
        acc.add(tx)?;
    }
    Ok(acc)
}

pub fn by_category(
    transactions: &[FinancialTransaction],
) -> ResultEngine<BTreeMap<String, Totals>> {
    let mut out: BTreeMap<String, Totals> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| counted(tx)) {
        out.entry(tx.category.clone()).or_default().add(tx)?;
    }
    Ok(out)
}

pub fn by_month(transactions: &[FinancialTransaction]) -> ResultEngine<BTreeMap<String, Totals>> {
    let mut out: BTreeMap<String, Totals> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| counted(tx)) {
        let key = format!("{:04}-{:02}", tx.occurred_at.year(), tx.occurred_at.month());
        out.entry(key).or_default().add(tx)?;
    }
    Ok(out)
}

pub fn fee_totals(fees: &[StudentFee]) -> ResultEngine<FeeTotals> {
    let mut acc = FeeTotals::default();
    for fee in fees {
        acc.due_minor = checked_add(acc.due_minor, fee.amount_minor)?;
        acc.paid_minor = checked_add(acc.paid_minor, fee.paid_minor)?;
        acc.outstanding_minor = checked_add(acc.outstanding_minor, fee.outstanding_minor())?;
    }
    Ok(acc)
}

/// Full report in `currency`. Every row must be in that currency.
pub fn summary(
    currency: Currency,
    transactions: &[FinancialTransaction],
    fees: &[StudentFee],
) -> ResultEngine<Summary> {
    for tx in transactions {
        ensure_currency(currency, tx.currency)?;
    }
    for fee in fees {
        ensure_currency(currency, fee.currency)?;
    }
    Ok(Summary {
        currency,
        totals: totals(transactions)?,
        by_category: by_category(transactions)?,
        by_month: by_month(transactions)?,
        fees: fee_totals(fees)?,
    })
}

/// Writes transactions as CSV, amounts in major units of their currency.
pub fn write_transactions_csv<W: std::io::Write>(
    writer: W,
    transactions: &[FinancialTransaction],
) -> ResultEngine<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "id",
        "occurred_at",
        "kind",
        "category",
        "amount",
        "currency",
        "status",
        "profile_id",
        "description",
    ])?;
    for tx in transactions {
        let profile_id = tx.profile_id.map(|id| id.to_string()).unwrap_or_default();
        csv.write_record([
            tx.id.to_string().as_str(),
            tx.occurred_at.to_rfc3339().as_str(),
            tx.kind.as_str(),
            tx.category.as_str(),
            Money::new(tx.amount_minor, tx.currency).format_major().as_str(),
            tx.currency.code(),
            tx.status.as_str(),
            profile_id.as_str(),
            tx.description.as_deref().unwrap_or_default(),
        ])?;
    }
    csv.flush()
        .map_err(|err| EngineError::Export(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn tx(kind: TransactionKind, category: &str, amount_minor: i64, month: u32) -> FinancialTransaction {
        let at = Utc.with_ymd_and_hms(2026, month, 10, 8, 0, 0).unwrap();
        FinancialTransaction::new(
            kind,
            category.to_string(),
            amount_minor,
            Currency::Omr,
            None,
            None,
            Vec::new(),
            TransactionStatus::Completed,
            "finance".to_string(),
            at,
            at,
        )
        .unwrap()
    }

    #[test]
    fn income_and_expense_fold_into_net() {
        let txs = [
            tx(TransactionKind::Income, "fees", 100, 1),
            tx(TransactionKind::Expense, "supplies", 30, 1),
        ];
        assert_eq!(
            totals(&txs).unwrap(),
            Totals {
                revenue_minor: 100,
                expenses_minor: 30,
                net_minor: 70,
            }
        );
    }

    #[test]
    fn cancelled_transactions_are_ignored() {
        let mut cancelled = tx(TransactionKind::Income, "fees", 500, 2);
        cancelled.status = TransactionStatus::Cancelled;
        let txs = [tx(TransactionKind::Income, "fees", 100, 2), cancelled];
        assert_eq!(totals(&txs).unwrap().revenue_minor, 100);
        assert_eq!(by_category(&txs).unwrap()["fees"].revenue_minor, 100);
    }

    #[test]
    fn groups_by_category_and_month() {
        let txs = [
            tx(TransactionKind::Income, "fees", 100, 1),
            tx(TransactionKind::Income, "fees", 50, 2),
            tx(TransactionKind::Expense, "transport", 20, 2),
        ];
        let categories = by_category(&txs).unwrap();
        assert_eq!(categories["fees"].revenue_minor, 150);
        assert_eq!(categories["transport"].net_minor, -20);

        let months = by_month(&txs).unwrap();
        assert_eq!(months.keys().collect::<Vec<_>>(), vec!["2026-01", "2026-02"]);
        assert_eq!(months["2026-02"].net_minor, 30);
    }

    #[test]
    fn fee_totals_track_outstanding() {
        let fee = |amount_minor, paid_minor| StudentFee {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            title: "Bus".to_string(),
            amount_minor,
            paid_minor,
            currency: Currency::Omr,
            due_date: None,
            created_at: Utc::now(),
        };
        let totals = fee_totals(&[fee(100, 40), fee(60, 60)]).unwrap();
        assert_eq!(
            totals,
            FeeTotals {
                due_minor: 160,
                paid_minor: 100,
                outstanding_minor: 60,
            }
        );
    }

    #[test]
    fn totals_out_of_range_are_errors() {
        let mut big = tx(TransactionKind::Income, "fees", 1, 1);
        big.amount_minor = i64::MAX;
        let txs = [big.clone(), big];
        assert!(matches!(totals(&txs), Err(EngineError::InvalidAmount(_))));
        assert!(matches!(by_category(&txs), Err(EngineError::InvalidAmount(_))));
        assert!(matches!(by_month(&txs), Err(EngineError::InvalidAmount(_))));

        let mut expense = tx(TransactionKind::Expense, "fees", 1, 1);
        expense.amount_minor = i64::MAX;
        let mut income = tx(TransactionKind::Income, "fees", 1, 1);
        income.amount_minor = -10;
        assert!(matches!(
            totals(&[income, expense]),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn fee_totals_out_of_range_are_errors() {
        let fee = StudentFee {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            title: "Bus".to_string(),
            amount_minor: i64::MAX,
            paid_minor: 0,
            currency: Currency::Omr,
            due_date: None,
            created_at: Utc::now(),
        };
        assert!(matches!(
            fee_totals(&[fee.clone(), fee]),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn summary_rejects_rows_in_another_currency() {
        let mut usd = tx(TransactionKind::Income, "fees", 500, 1);
        usd.currency = Currency::Usd;
        let txs = [tx(TransactionKind::Income, "fees", 10, 1), usd];
        assert!(matches!(
            summary(Currency::Omr, &txs, &[]),
            Err(EngineError::CurrencyMismatch(_))
        ));
        assert_eq!(
            summary(Currency::Omr, &txs[..1], &[]).unwrap().totals.revenue_minor,
            10
        );
    }

    #[test]
    fn csv_has_header_and_major_unit_amounts() {
        let mut out = Vec::new();
        write_transactions_csv(&mut out, &[tx(TransactionKind::Expense, "meals, lunch", 1250, 3)])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,occurred_at,kind,category,amount,currency,status,profile_id,description"
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",expense,\"meals, lunch\",1.250,OMR,completed,,"));
        assert!(lines.next().is_none());
    }
}
