//! Session introspection.

use api_types::session::MeViews;
use axum::{Extension, Json};
use engine::Actor;

use crate::{ServerError, convert};

/// Views the caller may open, straight from the role table.
pub async fn views(Extension(actor): Extension<Actor>) -> Result<Json<MeViews>, ServerError> {
    let profile_id = actor
        .profile_id
        .ok_or_else(|| ServerError::Generic("session has no profile".to_string()))?;
    Ok(Json(MeViews {
        username: actor.username,
        profile_id,
        role: convert::role(actor.role),
        views: actor.role.views().iter().copied().map(convert::view).collect(),
    }))
}
