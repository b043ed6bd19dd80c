//! Perception dispatch over REST.
//!
//! The perception joins the soul's queue and its turn runs in the
//! background; the output arrives as soul events on the WebSocket.

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use kathor_types::error::EngineError;
use kathor_types::perception::{ACTION_HONKED, ACTION_SAID, HONK_CONTENT, Perception};
use kathor_types::soul::SoulId;

use super::parse_soul_id;
use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Name used when a client does not say who is talking.
pub const DEFAULT_USER_NAME: &str = "User";

/// Body of `POST /api/v1/souls/{id}/perceptions`.
#[derive(Debug, Deserialize)]
pub struct PerceptionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub content: String,
}

fn default_action() -> String {
    ACTION_SAID.to_string()
}

impl PerceptionRequest {
    /// Validate and convert into a perception.
    pub fn into_perception(self) -> Result<Perception, AppError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());

        match self.action.as_str() {
            ACTION_HONKED => Ok(Perception {
                name,
                action: self.action,
                content: if self.content.is_empty() {
                    HONK_CONTENT.to_string()
                } else {
                    self.content
                },
            }),
            ACTION_SAID if self.content.trim().is_empty() => {
                Err(AppError::Validation("content must not be empty".to_string()))
            }
            ACTION_SAID => Ok(Perception::said(name, self.content)),
            other => Err(AppError::Validation(format!(
                "unsupported action '{other}', expected '{ACTION_SAID}' or '{ACTION_HONKED}'"
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub soul_id: SoulId,
    pub action: String,
}

/// POST /api/v1/souls/{id}/perceptions - Dispatch a perception.
pub async fn dispatch_perception(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<PerceptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Accepted>>), AppError> {
    let start = Instant::now();
    let soul_id = parse_soul_id(&id)?;
    if !state.engine.contains(soul_id) {
        return Err(EngineError::SoulNotFound(soul_id).into());
    }

    let Json(body) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let perception = body.into_perception()?;
    let action = perception.action.clone();
    state.engine.enqueue(soul_id, perception)?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(Accepted { soul_id, action }, elapsed)
        .with_link("ws", format!("/api/v1/souls/{id}/ws"));
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(action: &str, content: &str) -> PerceptionRequest {
        PerceptionRequest {
            name: None,
            action: action.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn said_defaults_name_to_user() {
        let p = request("said", "Paris in spring?").into_perception().unwrap();
        assert_eq!(p, Perception::said("User", "Paris in spring?"));
    }

    #[test]
    fn honk_fills_in_button_content() {
        let p = request("honked", "").into_perception().unwrap();
        assert!(p.is_honk());
        assert_eq!(p.content, HONK_CONTENT);
    }

    #[test]
    fn empty_said_is_rejected() {
        assert!(matches!(
            request("said", "  ").into_perception(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(matches!(
            request("waved", "hi").into_perception(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn action_defaults_to_said() {
        let body: PerceptionRequest = serde_json::from_str(r#"{"content":"hello"}"#).unwrap();
        assert_eq!(body.action, "said");
    }
}
