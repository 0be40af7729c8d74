use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{fees, me, profiles, reports, transactions, wallets};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolves Basic credentials to an [`engine::Actor`] and stores it as a
/// request extension for the handlers.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let actor = state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await
        .map_err(|err| {
            tracing::error!("authentication failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    tracing::debug!(username = %actor.username, role = actor.role.as_str(), "authenticated");
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/me/views", get(me::views))
        .route("/profiles", post(profiles::create))
        .route("/profiles/search", get(profiles::search))
        .route(
            "/profiles/{id}",
            get(profiles::get).patch(profiles::update),
        )
        .route("/profiles/{id}/cards", post(profiles::assign_card))
        .route(
            "/cards/{card_id}",
            axum::routing::delete(profiles::remove_card),
        )
        .route("/wallets/{profile_id}", get(wallets::balance))
        .route("/wallets/{profile_id}/history", get(wallets::history))
        .route("/wallets/{profile_id}/top-up", post(wallets::top_up))
        .route("/wallets/{profile_id}/debit", post(wallets::debit))
        .route("/wallets/{profile_id}/audit", get(wallets::audit))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/{id}", get(transactions::get))
        .route("/transactions/{id}/status", post(transactions::set_status))
        .route("/fees", get(fees::list).post(fees::assign))
        .route("/fees/{id}/payments", post(fees::pay))
        .route("/reports/summary", get(reports::summary))
        .route("/reports/transactions.csv", get(reports::transactions_csv))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(Arc::new(engine), listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState { engine };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
