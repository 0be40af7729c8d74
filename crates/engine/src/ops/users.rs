use sea_orm::{ActiveValue, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, EngineError, ResultEngine, Role,
    changes::{self, Table},
    users::{self, hash_password, verify_password},
    util::{normalize_text, parse_uuid},
};

use super::{Engine, profiles::require_profile, with_tx};

impl Engine {
    /// Creates login credentials for an existing profile.
    ///
    /// Authorization: admin only.
    pub async fn create_user(
        &self,
        actor: &Actor,
        username: &str,
        password: &str,
        profile_id: Uuid,
    ) -> ResultEngine<()> {
        if actor.role != Role::Admin {
            return Err(EngineError::Forbidden("only admins can create users".to_string()));
        }
        let username = normalize_text(username);
        if username.is_empty() || password.is_empty() {
            return Err(EngineError::Validation(
                "username and password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            require_profile(&db_tx, profile_id).await?;
            let taken = users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(username.clone()));
            }
            users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password_hash: ActiveValue::Set(hash_password(password)),
                profile_id: ActiveValue::Set(profile_id.to_string()),
            }
            .insert(&db_tx)
            .await?;
            Ok(())
        })?;

        tracing::info!(%username, %profile_id, "user created");
        self.publish(&[changes::insert(Table::Users)]);
        Ok(())
    }

    /// Resolves credentials to an [`Actor`]. `None` means unknown user or
    /// wrong password; the two are not distinguished.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Option<Actor>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?;
        let Some(user) = user else {
            return Ok(None);
        };
        if !verify_password(&user.password_hash, password) {
            return Ok(None);
        }

        let profile_id = parse_uuid(&user.profile_id, "profile")?;
        let profile = require_profile(&self.database, profile_id).await?;
        let role = Role::try_from(profile.role.as_str())?;
        Ok(Some(Actor::new(user.username, profile_id, role)))
    }
}
