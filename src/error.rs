use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Domain and transport errors surfaced to clients.
///
/// Everything except `ScanTimeout` and `Storage` is terminal for the request:
/// retrying without changing the input cannot succeed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid QR or wrong key")]
    Decryption,

    #[error("invalid QR format")]
    MalformedPayload,

    #[error("user not found")]
    UnknownMember,

    #[error("identity does not match")]
    IdentityMismatch,

    #[error("user is not registered for this event")]
    NotRegistered,

    #[error("already timed in for this event")]
    AlreadyTimedIn,

    #[error("already timed out for this event")]
    AlreadyTimedOut,

    #[error("must time in first")]
    NoTimeIn,

    #[error("already registered for this event")]
    DuplicateRegistration,

    #[error("scan timed out, please retry")]
    ScanTimeout,

    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Decryption | AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::UnknownMember | AppError::NotRegistered => StatusCode::NOT_FOUND,
            AppError::IdentityMismatch => StatusCode::FORBIDDEN,
            AppError::AlreadyTimedIn
            | AppError::AlreadyTimedOut
            | AppError::NoTimeIn
            | AppError::DuplicateRegistration => StatusCode::CONFLICT,
            AppError::ScanTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Storage { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}

/// Failures reported by a [`Store`](crate::store::Store) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key")]
    Duplicate,

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("{0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Storage(err.to_string())
    }
}
