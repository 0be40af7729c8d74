use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Actor, EngineError, NewProfileCmd, Profile, ProfileUpdateCmd, ResultEngine, Role, View,
    changes::{self, Table},
    profile_cards, profiles,
    util::{normalize_optional, normalize_required, normalize_text},
};

use super::{Engine, clamp_limit, with_tx};

/// Loads a profile row or fails with `KeyNotFound`.
pub(super) async fn require_profile<C: ConnectionTrait>(
    db: &C,
    profile_id: Uuid,
) -> ResultEngine<profiles::Model> {
    profiles::Entity::find_by_id(profile_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("profile not exists".to_string()))
}

fn require_admin(actor: &Actor) -> ResultEngine<()> {
    if actor.role != Role::Admin {
        return Err(EngineError::Forbidden(
            "only admins can manage profiles".to_string(),
        ));
    }
    Ok(())
}

/// A profile is readable by its owner and by anyone who can open the
/// profile directory.
fn require_profile_read(actor: &Actor, profile_id: Uuid) -> ResultEngine<()> {
    if actor.is(profile_id) {
        return Ok(());
    }
    actor.role.require(View::Profiles)
}

async fn cards_by_profile<C: ConnectionTrait>(
    db: &C,
    profile_ids: Vec<String>,
) -> ResultEngine<HashMap<String, Vec<String>>> {
    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    if profile_ids.is_empty() {
        return Ok(out);
    }
    let cards = profile_cards::Entity::find()
        .filter(profile_cards::Column::ProfileId.is_in(profile_ids))
        .order_by_asc(profile_cards::Column::CardId)
        .all(db)
        .await?;
    for card in cards {
        out.entry(card.profile_id).or_default().push(card.card_id);
    }
    Ok(out)
}

async fn with_cards<C: ConnectionTrait>(
    db: &C,
    models: Vec<profiles::Model>,
) -> ResultEngine<Vec<Profile>> {
    let ids = models.iter().map(|m| m.id.clone()).collect();
    let mut cards = cards_by_profile(db, ids).await?;
    models
        .into_iter()
        .map(|model| {
            let card_ids = cards.remove(&model.id).unwrap_or_default();
            let mut profile = Profile::try_from(model)?;
            profile.card_ids = card_ids;
            Ok(profile)
        })
        .collect()
}

async fn ensure_email_free<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except: Option<Uuid>,
) -> ResultEngine<()> {
    let mut query = profiles::Entity::find()
        .filter(Expr::cust("LOWER(email)").eq(email.to_lowercase()));
    if let Some(id) = except {
        query = query.filter(profiles::Column::Id.ne(id.to_string()));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::ExistingKey(email.to_string()));
    }
    Ok(())
}

impl Engine {
    /// Creates a profile. Email addresses are unique, ignoring case.
    ///
    /// Authorization: admin only.
    pub async fn create_profile(&self, actor: &Actor, cmd: NewProfileCmd) -> ResultEngine<Profile> {
        require_admin(actor)?;
        let full_name = normalize_required(&cmd.full_name, "full name")?;
        let profile = Profile::new(
            full_name,
            normalize_optional(cmd.full_name_localized.as_deref()),
            normalize_optional(cmd.email.as_deref()),
            normalize_optional(cmd.phone.as_deref()),
            cmd.role,
            Utc::now(),
        );

        with_tx!(self, |db_tx| {
            if let Some(email) = profile.email.as_deref() {
                ensure_email_free(&db_tx, email, None).await?;
            }
            profiles::ActiveModel::from(&profile).insert(&db_tx).await?;
            Ok(())
        })?;

        tracing::info!(profile_id = %profile.id, role = profile.role.as_str(), "profile created");
        self.publish(&[changes::insert(Table::Profiles)]);
        Ok(profile)
    }

    /// Applies a partial update.
    ///
    /// Authorization: admins may change anything; a user may edit their own
    /// contact fields but not their role.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        profile_id: Uuid,
        cmd: ProfileUpdateCmd,
    ) -> ResultEngine<Profile> {
        if actor.role != Role::Admin {
            if !actor.is(profile_id) {
                return Err(EngineError::Forbidden(
                    "cannot edit another profile".to_string(),
                ));
            }
            if cmd.role.is_some() {
                return Err(EngineError::Forbidden("cannot change own role".to_string()));
            }
        }
        if cmd.is_empty() {
            return Err(EngineError::Validation(
                "provide at least one field to update".to_string(),
            ));
        }

        let profile = with_tx!(self, |db_tx| {
            require_profile(&db_tx, profile_id).await?;

            let mut active = profiles::ActiveModel {
                id: ActiveValue::Set(profile_id.to_string()),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            if let Some(name) = cmd.full_name.as_deref() {
                active.full_name = ActiveValue::Set(normalize_required(name, "full name")?);
            }
            if let Some(name) = cmd.full_name_localized.as_deref() {
                active.full_name_localized = ActiveValue::Set(normalize_optional(Some(name)));
            }
            if let Some(email) = cmd.email.as_deref() {
                let email = normalize_optional(Some(email));
                if let Some(email) = email.as_deref() {
                    ensure_email_free(&db_tx, email, Some(profile_id)).await?;
                }
                active.email = ActiveValue::Set(email);
            }
            if let Some(phone) = cmd.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional(Some(phone)));
            }
            if let Some(role) = cmd.role {
                active.role = ActiveValue::Set(role.as_str().to_string());
            }
            let model = active.update(&db_tx).await?;

            let mut profiles = with_cards(&db_tx, vec![model]).await?;
            profiles
                .pop()
                .ok_or_else(|| EngineError::KeyNotFound("profile not exists".to_string()))
        })?;

        self.publish(&[changes::update(Table::Profiles)]);
        Ok(profile)
    }

    /// Returns a profile with its card ids.
    pub async fn profile(&self, actor: &Actor, profile_id: Uuid) -> ResultEngine<Profile> {
        require_profile_read(actor, profile_id)?;
        let model = require_profile(&self.database, profile_id).await?;
        let mut profiles = with_cards(&self.database, vec![model]).await?;
        profiles
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound("profile not exists".to_string()))
    }

    /// Searches the directory.
    ///
    /// Matches the query as a case-insensitive substring of either name, the
    /// phone, the email or any card id. Results are ordered by name and
    /// capped at [`MAX_PAGE_SIZE`](super::MAX_PAGE_SIZE); an empty query
    /// returns the first profiles by name.
    pub async fn search_profiles(
        &self,
        actor: &Actor,
        query: &str,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<Profile>> {
        actor.role.require(View::Profiles)?;
        let limit = clamp_limit(limit);
        let query = normalize_text(query);

        let base = profiles::Entity::find()
            .order_by_asc(profiles::Column::FullName)
            .order_by_asc(profiles::Column::Id);

        if query.is_empty() {
            let models = base.limit(limit).all(&self.database).await?;
            return with_cards(&self.database, models).await;
        }

        // SQLite only folds ASCII case, so matching happens here to stay
        // correct for localized names.
        let models = base.all(&self.database).await?;
        let profiles = with_cards(&self.database, models).await?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(profiles
            .into_iter()
            .filter(|profile| profile.matches(&query))
            .take(limit)
            .collect())
    }

    /// Attaches a card id to a profile. Card ids are unique, ignoring case.
    ///
    /// Authorization: staff with access to the profile directory.
    pub async fn assign_card(
        &self,
        actor: &Actor,
        profile_id: Uuid,
        card_id: &str,
    ) -> ResultEngine<Profile> {
        actor.role.require(View::Profiles)?;
        if !actor.role.is_staff() {
            return Err(EngineError::Forbidden("only staff can assign cards".to_string()));
        }
        let card_id = normalize_text(card_id);
        if card_id.is_empty() {
            return Err(EngineError::Validation(
                "card id must not be empty".to_string(),
            ));
        }

        let profile = with_tx!(self, |db_tx| {
            let model = require_profile(&db_tx, profile_id).await?;
            let taken = profile_cards::Entity::find()
                .filter(Expr::cust("LOWER(card_id)").eq(card_id.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(card_id.clone()));
            }
            profile_cards::ActiveModel {
                card_id: ActiveValue::Set(card_id.clone()),
                profile_id: ActiveValue::Set(profile_id.to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            let mut profiles = with_cards(&db_tx, vec![model]).await?;
            profiles
                .pop()
                .ok_or_else(|| EngineError::KeyNotFound("profile not exists".to_string()))
        })?;

        self.publish(&[changes::insert(Table::ProfileCards)]);
        Ok(profile)
    }

    /// Detaches a card id, matched ignoring case like [`Engine::assign_card`].
    pub async fn remove_card(&self, actor: &Actor, card_id: &str) -> ResultEngine<()> {
        actor.role.require(View::Profiles)?;
        if !actor.role.is_staff() {
            return Err(EngineError::Forbidden("only staff can remove cards".to_string()));
        }
        let result = profile_cards::Entity::delete_many()
            .filter(Expr::cust("LOWER(card_id)").eq(normalize_text(card_id).to_lowercase()))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("card not exists".to_string()));
        }
        self.publish(&[changes::delete(Table::ProfileCards)]);
        Ok(())
    }
}
