// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponseBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Authentication,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    /// Nameserver unreachable or update rejected. Retryable by the caller.
    #[error("dns transport error: {0}")]
    DnsTransport(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn internal<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }

    /// Map a repository error, turning unique-constraint violations into
    /// `Conflict`. The storage-level constraint, not an application
    /// pre-check, is what decides races between concurrent inserts.
    pub fn from_db(err: sqlx::Error, conflict_msg: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(conflict_msg.to_string())
            }
            _ => AppError::internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Authentication => (StatusCode::UNAUTHORIZED, "unauthorized".into()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found".into()),
            AppError::DnsTransport(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
            ),
        };

        let body = Json(ErrorResponseBody { error: msg });
        (status, body).into_response()
    }
}
