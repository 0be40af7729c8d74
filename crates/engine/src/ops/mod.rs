use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{
    ChangeEvent, Currency, EngineError, ResultEngine,
    changes::ChangeFeed,
};

mod fees;
mod finance;
mod profiles;
mod reports;
mod users;
mod wallets;

pub use fees::{FEES_CATEGORY, FeePayment};
pub use finance::{TransactionListFilter, TransactionPage};
pub use wallets::WalletAudit;

/// Run a block inside a DB transaction, committing on success.
///
/// An early return (`?`) inside the block drops the transaction, which rolls
/// it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Maximum number of rows a single list/search call returns.
pub const MAX_PAGE_SIZE: u64 = 50;

/// Entry point of every Bursar operation.
///
/// The engine is stateless apart from the database handle and the change
/// feed, so it can be shared behind an `Arc` by any number of request
/// handlers.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    currency: Currency,
    changes: ChangeFeed,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Currency every amount handled by this engine is expressed in.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Subscribe to change notifications for committed writes.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    fn publish(&self, events: &[ChangeEvent]) {
        self.changes.publish(events);
    }
}

fn clamp_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Position after the last row of a page, newest → older.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct PageCursor {
    at: DateTime<Utc>,
    id: String,
}

impl PageCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid cursor".to_string()))
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    currency: Currency,
    change_capacity: usize,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            currency: Currency::default(),
            change_capacity: 256,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Deployment currency (default `OMR`).
    pub fn currency(mut self, currency: Currency) -> EngineBuilder {
        self.currency = currency;
        self
    }

    /// How many undelivered change events a slow subscriber may lag behind.
    pub fn change_capacity(mut self, capacity: usize) -> EngineBuilder {
        self.change_capacity = capacity;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            currency: self.currency,
            changes: ChangeFeed::new(self.change_capacity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(500)), 50);
    }

    #[test]
    fn cursor_roundtrip_and_garbage() {
        let cursor = PageCursor {
            at: Utc::now(),
            id: "abc".to_string(),
        };
        let decoded = PageCursor::decode(&cursor.encode().unwrap()).unwrap();
        assert_eq!(decoded.id, "abc");
        assert!(matches!(
            PageCursor::decode("%%%"),
            Err(EngineError::InvalidCursor(_))
        ));
    }
}
