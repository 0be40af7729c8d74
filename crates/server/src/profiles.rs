//! Profile directory endpoints.

use api_types::profile::{
    CardNew, ProfileNew, ProfileSearch, ProfileSearchResponse, ProfileUpdate, ProfileView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Actor, NewProfileCmd, ProfileUpdateCmd};
use uuid::Uuid;

use crate::{ServerError, convert, server::ServerState};

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileNew>,
) -> Result<(StatusCode, Json<ProfileView>), ServerError> {
    let mut cmd = NewProfileCmd::new(payload.full_name, convert::role_from_api(payload.role));
    cmd.full_name_localized = payload.full_name_localized;
    cmd.email = payload.email;
    cmd.phone = payload.phone;

    let profile = state.engine.create_profile(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(convert::profile(profile))))
}

pub async fn search(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<ProfileSearch>,
) -> Result<Json<ProfileSearchResponse>, ServerError> {
    let profiles = state
        .engine
        .search_profiles(&actor, query.q.as_deref().unwrap_or_default(), query.limit)
        .await?;
    Ok(Json(ProfileSearchResponse {
        profiles: profiles.into_iter().map(convert::profile).collect(),
    }))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileView>, ServerError> {
    let profile = state.engine.profile(&actor, id).await?;
    Ok(Json(convert::profile(profile)))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>, ServerError> {
    let cmd = ProfileUpdateCmd {
        full_name: payload.full_name,
        full_name_localized: payload.full_name_localized,
        email: payload.email,
        phone: payload.phone,
        role: payload.role.map(convert::role_from_api),
    };
    let profile = state.engine.update_profile(&actor, id, cmd).await?;
    Ok(Json(convert::profile(profile)))
}

pub async fn assign_card(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CardNew>,
) -> Result<(StatusCode, Json<ProfileView>), ServerError> {
    let profile = state
        .engine
        .assign_card(&actor, id, &payload.card_id)
        .await?;
    Ok((StatusCode::CREATED, Json(convert::profile(profile))))
}

pub async fn remove_card(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(card_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_card(&actor, &card_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
