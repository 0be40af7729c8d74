use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Omr,
    Usd,
    Eur,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// Set when a wallet debit was rejected for insufficient funds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_minor: Option<i64>,
}

pub mod session {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Admin,
        Teacher,
        Parent,
        Student,
        Driver,
        Finance,
        Canteen,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum View {
        Dashboard,
        Profiles,
        Finance,
        Transactions,
        Fees,
        Teachers,
        Students,
        Buses,
        Routes,
        Wallet,
        Meals,
        Schedule,
        Reports,
    }

    /// Response of `GET /me/views`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MeViews {
        pub username: String,
        pub profile_id: Uuid,
        pub role: Role,
        pub views: Vec<View>,
    }
}

pub mod profile {
    use super::{session::Role, *};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileNew {
        pub full_name: String,
        pub full_name_localized: Option<String>,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub role: Role,
    }

    /// Partial update: absent fields stay unchanged, an empty string clears
    /// an optional field.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub full_name: Option<String>,
        pub full_name_localized: Option<String>,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub role: Option<Role>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileSearch {
        pub q: Option<String>,
        /// Clamped to `1..=50`.
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardNew {
        pub card_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileView {
        pub id: Uuid,
        pub full_name: String,
        pub full_name_localized: Option<String>,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub role: Role,
        pub card_ids: Vec<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileSearchResponse {
        pub profiles: Vec<ProfileView>,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub profile_id: Uuid,
        pub balance_minor: i64,
        pub currency: Currency,
        pub updated_at: Option<DateTime<Utc>>,
    }

    /// Body of top-up and debit requests.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletMovement {
        /// Must be > 0.
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletEntryView {
        pub id: i64,
        /// Signed: credits are positive, debits negative.
        pub amount_minor: i64,
        pub balance_after_minor: i64,
        pub currency: Currency,
        pub description: Option<String>,
        pub financial_transaction_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletHistory {
        pub limit: Option<u64>,
        /// Return entries older than this entry id.
        pub before_id: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletHistoryResponse {
        pub entries: Vec<WalletEntryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletAuditView {
        pub profile_id: Uuid,
        pub stored_minor: i64,
        pub replayed_minor: i64,
        pub entries: u64,
        pub consistent: bool,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Pending,
        Completed,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        pub category: String,
        /// Must be > 0. The kind defines the direction.
        pub amount_minor: i64,
        pub profile_id: Option<Uuid>,
        /// Deduct an expense from `profile_id`'s wallet.
        #[serde(default)]
        pub charge_wallet: bool,
        pub description: Option<String>,
        /// URLs of already uploaded documents.
        #[serde(default)]
        pub documents: Vec<String>,
        /// Defaults to `completed`.
        pub status: Option<TransactionStatus>,
        /// RFC3339 timestamp, including timezone offset. Defaults to now.
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionStatusUpdate {
        pub status: TransactionStatus,
    }

    /// Query of `GET /transactions` and the report endpoints.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub kind: Option<TransactionKind>,
        pub status: Option<TransactionStatus>,
        pub profile_id: Option<Uuid>,
        pub category: Option<String>,
        /// Inclusive lower bound on `occurred_at`.
        pub from: Option<DateTime<FixedOffset>>,
        /// Exclusive upper bound on `occurred_at`.
        pub to: Option<DateTime<FixedOffset>>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub category: String,
        pub amount_minor: i64,
        pub currency: Currency,
        pub profile_id: Option<Uuid>,
        pub description: Option<String>,
        pub documents: Vec<String>,
        pub status: TransactionStatus,
        pub created_by: String,
        pub occurred_at: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub wallet_transaction_id: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}

pub mod fee {
    use super::{transaction::TransactionView, *};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FeeStatus {
        Unpaid,
        Partial,
        Paid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeNew {
        pub profile_id: Uuid,
        pub title: String,
        pub amount_minor: i64,
        pub due_date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeList {
        pub profile_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeePaymentNew {
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeView {
        pub id: Uuid,
        pub profile_id: Uuid,
        pub title: String,
        pub amount_minor: i64,
        pub paid_minor: i64,
        pub outstanding_minor: i64,
        pub currency: Currency,
        pub status: FeeStatus,
        pub due_date: Option<NaiveDate>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeListResponse {
        pub fees: Vec<FeeView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeePaymentView {
        pub fee: FeeView,
        pub transaction: TransactionView,
    }
}

pub mod report {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Totals {
        pub revenue_minor: i64,
        pub expenses_minor: i64,
        pub net_minor: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FeeTotals {
        pub due_minor: i64,
        pub paid_minor: i64,
        pub outstanding_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Summary {
        pub currency: Currency,
        pub totals: Totals,
        pub by_category: BTreeMap<String, Totals>,
        /// Keyed by `YYYY-MM` (UTC).
        pub by_month: BTreeMap<String, Totals>,
        pub fees: FeeTotals,
    }
}
