//! Change notifications.
//!
//! The engine publishes one [`ChangeEvent`] per table touched by a committed
//! write. Subscribers treat an event as "table changed, fetch again"; no row
//! data travels with it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    ProfileCards,
    Users,
    WalletBalances,
    WalletTransactions,
    FinancialTransactions,
    StudentFees,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::ProfileCards => "profile_cards",
            Self::Users => "users",
            Self::WalletBalances => "wallet_balances",
            Self::WalletTransactions => "wallet_transactions",
            Self::FinancialTransactions => "financial_transactions",
            Self::StudentFees => "student_fees",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: ChangeOp,
}

/// Fan-out of change events to any number of subscribers.
#[derive(Debug, Clone)]
pub(crate) struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publishes events in order. Having no subscriber is fine.
    pub(crate) fn publish(&self, events: &[ChangeEvent]) {
        for event in events {
            tracing::trace!(table = event.table.as_str(), op = ?event.op, "change");
            let _ = self.sender.send(*event);
        }
    }
}

pub(crate) const fn insert(table: Table) -> ChangeEvent {
    ChangeEvent {
        table,
        op: ChangeOp::Insert,
    }
}

pub(crate) const fn update(table: Table) -> ChangeEvent {
    ChangeEvent {
        table,
        op: ChangeOp::Update,
    }
}

pub(crate) const fn delete(table: Table) -> ChangeEvent {
    ChangeEvent {
        table,
        op: ChangeOp::Delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_silent() {
        let feed = ChangeFeed::new(4);
        feed.publish(&[insert(Table::Profiles)]);
    }

    #[test]
    fn subscribers_receive_events_in_order() {
        let feed = ChangeFeed::new(8);
        let mut rx = feed.subscribe();
        feed.publish(&[
            update(Table::WalletBalances),
            insert(Table::WalletTransactions),
        ]);
        assert_eq!(rx.try_recv().unwrap(), update(Table::WalletBalances));
        assert_eq!(rx.try_recv().unwrap(), insert(Table::WalletTransactions));
        assert!(rx.try_recv().is_err());
    }
}
