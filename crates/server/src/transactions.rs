//! Financial transactions endpoints.

use api_types::transaction::{
    TransactionList, TransactionListResponse, TransactionNew, TransactionStatusUpdate,
    TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Actor, RecordTransactionCmd};
use uuid::Uuid;

use crate::{ServerError, convert, server::ServerState};

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let occurred_at = payload
        .occurred_at
        .map_or_else(Utc::now, |at| at.with_timezone(&Utc));

    let mut cmd = RecordTransactionCmd::new(
        convert::kind_from_api(payload.kind),
        payload.category,
        payload.amount_minor,
        occurred_at,
    );
    cmd.profile_id = payload.profile_id;
    cmd.charge_wallet = payload.charge_wallet;
    cmd.description = payload.description;
    cmd.documents = payload.documents;
    if let Some(status) = payload.status {
        cmd = cmd.status(convert::status_from_api(status));
    }

    let transaction = state.engine.record_transaction(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(convert::transaction(transaction))))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = convert::list_filter(&query);
    let page = state
        .engine
        .list_transactions(&actor, &filter, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(TransactionListResponse {
        transactions: page
            .transactions
            .into_iter()
            .map(convert::transaction)
            .collect(),
        next_cursor: page.next_cursor,
    }))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state.engine.financial_transaction(&actor, id).await?;
    Ok(Json(convert::transaction(transaction)))
}

pub async fn set_status(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionStatusUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state
        .engine
        .set_transaction_status(&actor, id, convert::status_from_api(payload.status))
        .await?;
    Ok(Json(convert::transaction(transaction)))
}
