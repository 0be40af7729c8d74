use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod convert;
mod fees;
mod me;
mod profiles;
mod reports;
mod server;
mod transactions;
mod wallets;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) | EngineError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidId(_) | EngineError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
        EngineError::InsufficientFunds { .. }
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidStatus(_)
        | EngineError::Validation(_)
        | EngineError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Export(export_err) => {
            tracing::error!("export error: {export_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => {
                let available_minor = match &err {
                    EngineError::InsufficientFunds {
                        available_minor, ..
                    } => Some(*available_minor),
                    _ => None,
                };
                (
                    status_for_engine_error(&err),
                    ErrorBody {
                        error: message_for_engine_error(err),
                        available_minor,
                    },
                )
            }
            ServerError::Generic(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: err,
                    available_minor: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
