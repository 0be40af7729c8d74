//! Aggregations and CSV export.

use api_types::{report::Summary, transaction::TransactionList};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use engine::Actor;

use crate::{ServerError, convert, server::ServerState};

pub async fn summary(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<Summary>, ServerError> {
    let summary = state
        .engine
        .report_summary(&actor, &convert::list_filter(&query))
        .await?;
    Ok(Json(convert::summary(summary)))
}

pub async fn transactions_csv(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<impl IntoResponse, ServerError> {
    let csv = state
        .engine
        .export_transactions_csv(&actor, &convert::list_filter(&query))
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv,
    ))
}
