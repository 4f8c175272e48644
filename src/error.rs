use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced across the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("broker error")]
    Broker(#[from] BrokerError),

    #[error("store error")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Broker(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Broker Error".to_string(),
            ),
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Store Error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Errors from the FIFO broker adapter (C2).
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker connection error: {0}")]
    Connection(String),
}

/// Errors from the store adapter (C1). Not every `StoreError` is a failure —
/// `insert_if_absent` reports `Inserted`/`Skipped` as a normal outcome;
/// `StoreError` represents everything else (connectivity, serialization).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transient store error: {0}")]
    Transient(#[from] sqlx::Error),

    #[error("schema migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
