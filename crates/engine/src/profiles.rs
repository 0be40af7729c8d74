//! The module contains `Profile` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Role, util::parse_uuid};

/// Identity record for any user of the school, whatever the role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    /// Name in the secondary (localized) script, if known.
    pub full_name_localized: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    /// Auxiliary identifiers (card ids) attached to this profile.
    ///
    /// Empty when the profile has no card: a missing card id is never
    /// replaced with a placeholder.
    pub card_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(
        full_name: String,
        full_name_localized: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name,
            full_name_localized,
            email,
            phone,
            role,
            card_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match over every searchable field.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let hit = |value: &str| value.to_lowercase().contains(&query);
        hit(self.full_name.as_str())
            || self.full_name_localized.as_deref().is_some_and(hit)
            || self.email.as_deref().is_some_and(hit)
            || self.phone.as_deref().is_some_and(hit)
            || self.card_ids.iter().any(|card| hit(card.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub full_name: String,
    pub full_name_localized: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::profile_cards::Entity")]
    Cards,
}

impl Related<super::profile_cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Profile> for ActiveModel {
    fn from(value: &Profile) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            full_name: ActiveValue::Set(value.full_name.clone()),
            full_name_localized: ActiveValue::Set(value.full_name_localized.clone()),
            email: ActiveValue::Set(value.email.clone()),
            phone: ActiveValue::Set(value.phone.clone()),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Profile {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "profile")?,
            full_name: model.full_name,
            full_name_localized: model.full_name_localized,
            email: model.email,
            phone: model.phone,
            role: Role::try_from(model.role.as_str())?,
            card_ids: Vec::new(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn profile() -> Profile {
        let mut profile = Profile::new(
            "Alia Al-Harthy".to_string(),
            Some("علياء الحارثي".to_string()),
            Some("alia@school.test".to_string()),
            Some("+968 9000 0001".to_string()),
            Role::Student,
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        profile.card_ids.push("CARD-77X".to_string());
        profile
    }

    #[test]
    fn matches_any_field_ignoring_case() {
        let profile = profile();
        assert!(profile.matches("ALI"));
        assert!(profile.matches("school.test"));
        assert!(profile.matches("9000"));
        assert!(profile.matches("card-77"));
        assert!(profile.matches("الحارثي"));
        assert!(!profile.matches("zaid"));
    }

    #[test]
    fn missing_optional_fields_never_match() {
        let profile = Profile::new(
            "Omar".to_string(),
            None,
            None,
            None,
            Role::Driver,
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        assert!(!profile.matches("@"));
        assert!(profile.card_ids.is_empty());
    }
}
