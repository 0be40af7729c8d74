//! Command structs for engine operations.
//!
//! These types group parameters for write operations (profiles, financial
//! transactions, fees), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Role, TransactionKind, TransactionStatus};

/// Who is performing an operation.
///
/// Built by the caller (HTTP session, admin CLI) and passed explicitly to
/// every engine operation that checks permissions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub profile_id: Option<Uuid>,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(username: impl Into<String>, profile_id: Uuid, role: Role) -> Self {
        Self {
            username: username.into(),
            profile_id: Some(profile_id),
            role,
        }
    }

    /// Administrative actor used by maintenance tooling.
    #[must_use]
    pub fn system() -> Self {
        Self {
            username: "system".to_string(),
            profile_id: None,
            role: Role::Admin,
        }
    }

    /// `true` when the actor is the owner of `profile_id`.
    #[must_use]
    pub fn is(&self, profile_id: Uuid) -> bool {
        self.profile_id == Some(profile_id)
    }
}

/// Create a profile.
#[derive(Clone, Debug)]
pub struct NewProfileCmd {
    pub full_name: String,
    pub full_name_localized: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

impl NewProfileCmd {
    #[must_use]
    pub fn new(full_name: impl Into<String>, role: Role) -> Self {
        Self {
            full_name: full_name.into(),
            full_name_localized: None,
            email: None,
            phone: None,
            role,
        }
    }

    #[must_use]
    pub fn localized(mut self, name: impl Into<String>) -> Self {
        self.full_name_localized = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Partial profile update. `None` leaves a field unchanged; for optional
/// fields an empty string clears the stored value.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdateCmd {
    pub full_name: Option<String>,
    pub full_name_localized: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

impl ProfileUpdateCmd {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.full_name_localized.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.role.is_none()
    }
}

/// Record a financial transaction.
#[derive(Clone, Debug)]
pub struct RecordTransactionCmd {
    pub kind: TransactionKind,
    pub category: String,
    pub amount_minor: i64,
    pub profile_id: Option<Uuid>,
    /// Deduct an expense from the linked profile's wallet.
    pub charge_wallet: bool,
    pub description: Option<String>,
    pub documents: Vec<String>,
    pub status: TransactionStatus,
    pub occurred_at: DateTime<Utc>,
}

impl RecordTransactionCmd {
    #[must_use]
    pub fn new(
        kind: TransactionKind,
        category: impl Into<String>,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            category: category.into(),
            amount_minor,
            profile_id: None,
            charge_wallet: false,
            description: None,
            documents: Vec::new(),
            status: TransactionStatus::Completed,
            occurred_at,
        }
    }

    #[must_use]
    pub fn income(category: impl Into<String>, amount_minor: i64, occurred_at: DateTime<Utc>) -> Self {
        Self::new(TransactionKind::Income, category, amount_minor, occurred_at)
    }

    #[must_use]
    pub fn expense(category: impl Into<String>, amount_minor: i64, occurred_at: DateTime<Utc>) -> Self {
        Self::new(TransactionKind::Expense, category, amount_minor, occurred_at)
    }

    #[must_use]
    pub fn profile(mut self, profile_id: Uuid) -> Self {
        self.profile_id = Some(profile_id);
        self
    }

    /// Link to `profile_id` and deduct the amount from its wallet.
    #[must_use]
    pub fn charge_wallet(mut self, profile_id: Uuid) -> Self {
        self.profile_id = Some(profile_id);
        self.charge_wallet = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn document(mut self, url: impl Into<String>) -> Self {
        self.documents.push(url.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }
}

/// Assign a fee to a student.
#[derive(Clone, Debug)]
pub struct AssignFeeCmd {
    pub profile_id: Uuid,
    pub title: String,
    pub amount_minor: i64,
    pub due_date: Option<NaiveDate>,
}

impl AssignFeeCmd {
    #[must_use]
    pub fn new(profile_id: Uuid, title: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            profile_id,
            title: title.into(),
            amount_minor,
            due_date: None,
        }
    }

    #[must_use]
    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}
