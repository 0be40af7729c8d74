//! Wallets API endpoints.

use api_types::wallet::{
    WalletAuditView, WalletEntryView, WalletHistory, WalletHistoryResponse, WalletMovement,
    WalletView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::Actor;
use uuid::Uuid;

use crate::{ServerError, convert, server::ServerState};

pub async fn balance(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<WalletView>, ServerError> {
    let balance = state.engine.wallet_balance(&actor, profile_id).await?;
    Ok(Json(convert::wallet(balance)))
}

pub async fn history(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(profile_id): Path<Uuid>,
    Query(query): Query<WalletHistory>,
) -> Result<Json<WalletHistoryResponse>, ServerError> {
    let entries = state
        .engine
        .wallet_history(&actor, profile_id, query.limit, query.before_id)
        .await?;
    Ok(Json(WalletHistoryResponse {
        entries: entries.into_iter().map(convert::wallet_entry).collect(),
    }))
}

pub async fn top_up(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(profile_id): Path<Uuid>,
    Json(payload): Json<WalletMovement>,
) -> Result<(StatusCode, Json<WalletEntryView>), ServerError> {
    let entry = state
        .engine
        .top_up_wallet(
            &actor,
            profile_id,
            payload.amount_minor,
            payload.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(convert::wallet_entry(entry))))
}

pub async fn debit(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(profile_id): Path<Uuid>,
    Json(payload): Json<WalletMovement>,
) -> Result<(StatusCode, Json<WalletEntryView>), ServerError> {
    let entry = state
        .engine
        .debit_wallet(
            &actor,
            profile_id,
            payload.amount_minor,
            payload.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(convert::wallet_entry(entry))))
}

pub async fn audit(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<WalletAuditView>, ServerError> {
    let audit = state.engine.audit_wallet(&actor, profile_id).await?;
    Ok(Json(convert::wallet_audit(audit)))
}
