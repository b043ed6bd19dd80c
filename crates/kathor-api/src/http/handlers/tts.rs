//! Speech proxy: `POST /api/tts`.
//!
//! Keeps a flat JSON shape instead of the API envelope: `{"audioUrl": ...}`
//! on success, `{"error": ...}` otherwise. Every failure, including a
//! malformed body, is a 500 with a generic message; details go to the log.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use kathor_types::tts::{SpeechRequest, SpeechResponse};

use crate::state::AppState;

fn error_response(status: StatusCode) -> Response {
    let message = status.canonical_reason().unwrap_or("Error");
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /api/tts - Synthesize speech and return it as a data URL.
pub async fn synthesize(
    State(state): State<AppState>,
    body: Result<Json<SpeechRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::error!(error = %rejection, "invalid speech request body");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match state
        .tts
        .synthesize_data_url(&request.text, request.voice_id.as_deref())
        .await
    {
        Ok(audio_url) => Json(SpeechResponse { audio_url }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "speech synthesis failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Any other method on `/api/tts`.
pub async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED)
}
