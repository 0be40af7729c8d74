//! Roles and the views each role may open.
//!
//! Every profile carries exactly one [`Role`]. What a role can see is
//! decided by [`Role::views`], a static table; permission checks in the
//! engine and the HTTP layer are derived from it instead of comparing role
//! strings.

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
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

const ADMIN_VIEWS: &[View] = &[
    View::Dashboard,
    View::Profiles,
    View::Finance,
    View::Transactions,
    View::Fees,
    View::Teachers,
    View::Students,
    View::Buses,
    View::Routes,
    View::Wallet,
    View::Meals,
    View::Schedule,
    View::Reports,
];
const FINANCE_VIEWS: &[View] = &[
    View::Dashboard,
    View::Profiles,
    View::Finance,
    View::Transactions,
    View::Fees,
    View::Wallet,
    View::Reports,
];
const TEACHER_VIEWS: &[View] = &[View::Dashboard, View::Students, View::Schedule];
const PARENT_VIEWS: &[View] = &[
    View::Dashboard,
    View::Wallet,
    View::Meals,
    View::Fees,
    View::Schedule,
];
const STUDENT_VIEWS: &[View] = &[View::Dashboard, View::Wallet, View::Meals, View::Schedule];
const DRIVER_VIEWS: &[View] = &[View::Dashboard, View::Buses, View::Routes];
const CANTEEN_VIEWS: &[View] = &[View::Dashboard, View::Profiles, View::Wallet, View::Meals];

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Parent => "parent",
            Self::Student => "student",
            Self::Driver => "driver",
            Self::Finance => "finance",
            Self::Canteen => "canteen",
        }
    }

    /// Views this role is allowed to open.
    pub fn views(self) -> &'static [View] {
        match self {
            Self::Admin => ADMIN_VIEWS,
            Self::Finance => FINANCE_VIEWS,
            Self::Teacher => TEACHER_VIEWS,
            Self::Parent => PARENT_VIEWS,
            Self::Student => STUDENT_VIEWS,
            Self::Driver => DRIVER_VIEWS,
            Self::Canteen => CANTEEN_VIEWS,
        }
    }

    pub fn can_open(self, view: View) -> bool {
        self.views().contains(&view)
    }

    /// Staff roles act on other people's records (wallets, fees, profiles).
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Finance | Self::Canteen)
    }

    /// Returns `Forbidden` unless the role may open `view`.
    pub fn require(self, view: View) -> Result<(), EngineError> {
        if self.can_open(view) {
            return Ok(());
        }
        Err(EngineError::Forbidden(format!(
            "role {} cannot access {view:?}",
            self.as_str()
        )))
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "parent" => Ok(Self::Parent),
            "student" => Ok(Self::Student),
            "driver" => Ok(Self::Driver),
            "finance" => Ok(Self::Finance),
            "canteen" => Ok(Self::Canteen),
            other => Err(EngineError::Validation(format!("invalid role: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Role; 7] = [
        Role::Admin,
        Role::Teacher,
        Role::Parent,
        Role::Student,
        Role::Driver,
        Role::Finance,
        Role::Canteen,
    ];

    #[test]
    fn role_strings_roundtrip() {
        for role in ALL {
            assert_eq!(Role::try_from(role.as_str()).unwrap(), role);
        }
        assert!(Role::try_from("janitor").is_err());
    }

    #[test]
    fn every_role_has_a_dashboard() {
        for role in ALL {
            assert!(role.can_open(View::Dashboard), "{role:?}");
        }
    }

    #[test]
    fn finance_views_are_limited_to_admin_and_finance() {
        let allowed: Vec<Role> = ALL
            .into_iter()
            .filter(|role| role.can_open(View::Finance))
            .collect();
        assert_eq!(allowed, vec![Role::Admin, Role::Finance]);
    }

    #[test]
    fn require_reports_forbidden() {
        assert!(Role::Driver.require(View::Buses).is_ok());
        assert!(matches!(
            Role::Driver.require(View::Wallet),
            Err(EngineError::Forbidden(_))
        ));
    }
}
