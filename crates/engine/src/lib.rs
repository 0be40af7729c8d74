//! Storage-backed core of Bursar: profiles, prepaid wallets, the school's
//! income/expense ledger, student fees and the reports built on them.
//!
//! Every operation goes through [`Engine`] and takes the calling [`Actor`];
//! permissions are derived from the actor's [`Role`].

pub use changes::{ChangeEvent, ChangeOp, Table};
pub use commands::{
    Actor, AssignFeeCmd, NewProfileCmd, ProfileUpdateCmd, RecordTransactionCmd,
};
pub use currency::Currency;
pub use error::EngineError;
pub use fees::{FeeStatus, StudentFee};
pub use financial_transactions::{FinancialTransaction, TransactionKind, TransactionStatus};
pub use money::Money;
pub use ops::{
    Engine, EngineBuilder, FEES_CATEGORY, FeePayment, MAX_PAGE_SIZE, TransactionListFilter,
    TransactionPage, WalletAudit,
};
pub use profiles::Profile;
pub use reports::{FeeTotals, Summary, Totals};
pub use roles::{Role, View};
pub use wallet_balances::WalletBalance;
pub use util::MAX_AMOUNT_MINOR;
pub use wallet_transactions::{WalletEntry, replay};

mod changes;
mod commands;
mod currency;
mod error;
mod fees;
mod financial_transactions;
mod money;
mod ops;
mod profile_cards;
mod profiles;
pub mod reports;
mod roles;
mod users;
mod util;
mod wallet_balances;
mod wallet_transactions;

type ResultEngine<T> = Result<T, EngineError>;
