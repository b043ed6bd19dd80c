//! Soul lifecycle handlers: create, inspect, reset, delete.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use kathor_types::soul::SoulSnapshot;

use super::parse_soul_id;
use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

fn with_soul_links(resp: ApiResponse<SoulSnapshot>, id: &str) -> ApiResponse<SoulSnapshot> {
    resp.with_link("self", format!("/api/v1/souls/{id}"))
        .with_link("perceptions", format!("/api/v1/souls/{id}/perceptions"))
        .with_link("ws", format!("/api/v1/souls/{id}/ws"))
}

/// POST /api/v1/souls - Start a new conversation.
pub async fn create_soul(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<SoulSnapshot>>), AppError> {
    let start = Instant::now();

    let id = state.engine.create_soul();
    let snapshot = state.engine.snapshot(id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = with_soul_links(ApiResponse::success(snapshot, elapsed), &id.to_string());
    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/souls/{id} - Process pointer, memory length and notes.
pub async fn get_soul(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SoulSnapshot>>, AppError> {
    let start = Instant::now();
    let soul_id = parse_soul_id(&id)?;

    let snapshot = state.engine.snapshot(soul_id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(with_soul_links(ApiResponse::success(snapshot, elapsed), &id)))
}

/// POST /api/v1/souls/{id}/reset - Start over.
///
/// Cancels a running turn and restores the initial memory, notes and
/// process.
pub async fn reset_soul(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SoulSnapshot>>, AppError> {
    let start = Instant::now();
    let soul_id = parse_soul_id(&id)?;

    state.engine.reset(soul_id).await?;
    let snapshot = state.engine.snapshot(soul_id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(with_soul_links(ApiResponse::success(snapshot, elapsed), &id)))
}

/// DELETE /api/v1/souls/{id} - End a conversation.
pub async fn delete_soul(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let soul_id = parse_soul_id(&id)?;
    if state.engine.remove(soul_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(kathor_types::error::EngineError::SoulNotFound(soul_id).into())
    }
}
