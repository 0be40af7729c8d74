//! Student fees endpoints.

use api_types::fee::{FeeList, FeeListResponse, FeeNew, FeePaymentNew, FeePaymentView, FeeView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Actor, AssignFeeCmd};
use uuid::Uuid;

use crate::{ServerError, convert, server::ServerState};

pub async fn assign(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<FeeNew>,
) -> Result<(StatusCode, Json<FeeView>), ServerError> {
    let mut cmd = AssignFeeCmd::new(payload.profile_id, payload.title, payload.amount_minor);
    cmd.due_date = payload.due_date;
    let fee = state.engine.assign_fee(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(convert::fee(fee))))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<FeeList>,
) -> Result<Json<FeeListResponse>, ServerError> {
    let fees = state.engine.list_fees(&actor, query.profile_id).await?;
    Ok(Json(FeeListResponse {
        fees: fees.into_iter().map(convert::fee).collect(),
    }))
}

pub async fn pay(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FeePaymentNew>,
) -> Result<(StatusCode, Json<FeePaymentView>), ServerError> {
    let payment = state
        .engine
        .record_fee_payment(&actor, id, payload.amount_minor)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(FeePaymentView {
            fee: convert::fee(payment.fee),
            transaction: convert::transaction(payment.transaction),
        }),
    ))
}
