//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use kathor_types::error::EngineError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Engine(EngineError),
    /// Malformed path or body.
    Validation(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Engine(EngineError::SoulNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "SOUL_NOT_FOUND",
                format!("Soul {id} not found"),
            ),
            AppError::Engine(e @ EngineError::Process(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PROCESS_FAILED", e.to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        (status, Json(ApiResponse::error(code, message))).into_response()
    }
}
