//! Axum router configuration with middleware.
//!
//! REST routes live under `/api/v1/`; the speech proxy is `/api/tts` and
//! the chat page is served from `/`.
//! Middleware: CORS (origins from `[server].allowed_origins`), tracing.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// CORS layer allowing any origin when `allowed_origins` is empty.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);

    let api_routes = Router::new()
        .route("/souls", post(handlers::soul::create_soul))
        .route(
            "/souls/{id}",
            get(handlers::soul::get_soul).delete(handlers::soul::delete_soul),
        )
        .route("/souls/{id}/reset", post(handlers::soul::reset_soul))
        .route(
            "/souls/{id}/perceptions",
            post(handlers::perception::dispatch_perception),
        )
        .route("/souls/{id}/ws", get(handlers::ws::ws_handler));

    Router::new()
        .nest("/api/v1", api_routes)
        .route(
            "/api/tts",
            post(handlers::tts::synthesize).fallback(handlers::tts::method_not_allowed),
        )
        .route("/", get(handlers::page::index))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use kathor_core::llm::BoxLlmProvider;
    use kathor_core::llm::scripted::ScriptedProvider;
    use kathor_core::process::initial::INTENT_CHAT;
    use kathor_core::soul::{SoulEngine, SoulRuntime};
    use kathor_infra::tts::ElevenLabsClient;
    use kathor_types::config::KathorConfig;
    use kathor_types::event::SoulEvent;

    use super::*;

    fn test_state(script: ScriptedProvider) -> AppState {
        let mut config = KathorConfig::default();
        config.memory.learn_about_user = false;
        config.tts.voice_id = Some("test-voice".to_string());
        let runtime = SoulRuntime::new(BoxLlmProvider::new(script), &config, "You are Kathor.");
        let tts = ElevenLabsClient::new(&config.tts, None);
        AppState::new(SoulEngine::new(runtime), tts, config)
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        build_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(state: &AppState) -> String {
        let response = send(state, "POST", "/api/v1/souls", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let state = test_state(ScriptedProvider::new());
        let response = send(&state, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn index_serves_chat_page() {
        let state = test_state(ScriptedProvider::new());
        let response = send(&state, "GET", "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("HONK"));
        assert!(html.contains("Start over"));
    }

    #[tokio::test]
    async fn created_soul_starts_in_initial_process() {
        let state = test_state(ScriptedProvider::new());
        let id = create(&state).await;

        let response = send(&state, "GET", &format!("/api/v1/souls/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["process"], "initial");
        assert_eq!(body["data"]["soul_name"], "Kathor");
        assert_eq!(body["data"]["memory_len"], 1);
        assert_eq!(body["_links"]["ws"], format!("/api/v1/souls/{id}/ws"));
    }

    #[tokio::test]
    async fn unknown_soul_is_404_envelope() {
        let state = test_state(ScriptedProvider::new());
        let id = kathor_types::soul::SoulId::new();
        let response = send(&state, "GET", &format!("/api/v1/souls/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["errors"][0]["code"], "SOUL_NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_soul_id_is_400() {
        let state = test_state(ScriptedProvider::new());
        let response = send(&state, "GET", "/api/v1/souls/not-a-uuid", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn perception_is_accepted_and_runs_in_background() {
        // An empty script fails the first generation, so the turn ends quickly.
        let state = test_state(ScriptedProvider::new());
        let id = create(&state).await;
        let mut events = state.engine.subscribe();

        let response = send(
            &state,
            "POST",
            &format!("/api/v1/souls/{id}/perceptions"),
            Some(r#"{"content":"Where should I go in May?"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(response).await["data"]["action"], "said");

        let started = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(started, SoulEvent::ProcessStarted { .. }));

        let failed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let SoulEvent::ProcessFailed { .. } = events.recv().await.unwrap() {
                    break;
                }
            }
        })
        .await;
        assert!(failed.is_ok());

        // Nothing committed by the failed turn
        let body = json_body(send(&state, "GET", &format!("/api/v1/souls/{id}"), None).await).await;
        assert_eq!(body["data"]["memory_len"], 1);
    }

    async fn finish_turns(events: &mut tokio::sync::broadcast::Receiver<SoulEvent>, turns: usize) {
        let mut finished = 0;
        tokio::time::timeout(Duration::from_secs(5), async {
            while finished < turns {
                if let SoulEvent::ProcessFinished { .. } = events.recv().await.unwrap() {
                    finished += 1;
                }
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn back_to_back_perceptions_keep_their_order() {
        let decided = serde_json::json!({ "decision": INTENT_CHAT }).to_string();
        let script = ScriptedProvider::new()
            .reply(decided.clone())
            .reply("Kathor said: \"Porto it is.\"")
            .reply(decided)
            .reply("Kathor said: \"Then Braga.\"");
        let state = test_state(script.clone());
        let id = create(&state).await;
        let mut events = state.engine.subscribe();

        for content in ["first stop Porto", "second stop Braga"] {
            let body = serde_json::json!({ "content": content }).to_string();
            let response = send(
                &state,
                "POST",
                &format!("/api/v1/souls/{id}/perceptions"),
                Some(&body),
            )
            .await;
            assert_eq!(response.status(), StatusCode::ACCEPTED);
        }
        finish_turns(&mut events, 2).await;

        let requests = script.requests();
        let mentions = |i: usize, text: &str| {
            requests[i].messages.iter().position(|m| m.content.contains(text))
        };
        assert!(mentions(0, "first stop").is_some());
        assert!(mentions(0, "second stop").is_none());
        assert!(mentions(2, "first stop") < mentions(2, "second stop"));
        assert!(mentions(2, "Porto it is.").is_some());

        let body = json_body(send(&state, "GET", &format!("/api/v1/souls/{id}"), None).await).await;
        assert_eq!(body["data"]["memory_len"], 5);
    }

    #[tokio::test]
    async fn malformed_perception_body_is_validation_envelope() {
        let state = test_state(ScriptedProvider::new());
        let id = create(&state).await;
        let response = send(
            &state,
            "POST",
            &format!("/api/v1/souls/{id}/perceptions"),
            Some("{not json"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn perception_with_unknown_action_is_rejected() {
        let state = test_state(ScriptedProvider::new());
        let id = create(&state).await;
        let response = send(
            &state,
            "POST",
            &format!("/api/v1/souls/{id}/perceptions"),
            Some(r#"{"action":"waved","content":"hi"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_then_delete() {
        let state = test_state(ScriptedProvider::new());
        let id = create(&state).await;

        let response = send(&state, "POST", &format!("/api/v1/souls/{id}/reset"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["process"], "initial");

        let response = send(&state, "DELETE", &format!("/api/v1/souls/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&state, "DELETE", &format!("/api/v1/souls/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn tts_rejects_other_methods_with_405() {
        let state = test_state(ScriptedProvider::new());
        for method in ["GET", "PUT", "DELETE"] {
            let response = send(&state, method, "/api/tts", None).await;
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(json_body(response).await["error"], "Method Not Allowed");
        }
    }

    #[tokio::test]
    async fn tts_failure_is_generic_500() {
        // No API key configured
        let state = test_state(ScriptedProvider::new());
        let response = send(&state, "POST", "/api/tts", Some(r#"{"text":"Bonjour"}"#)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn tts_malformed_body_is_500() {
        let state = test_state(ScriptedProvider::new());
        let response = send(&state, "POST", "/api/tts", Some("{not json")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Internal Server Error");
    }

    #[test]
    fn cors_accepts_configured_origins() {
        // Construction must not panic for valid or invalid entries
        let _ = cors_layer(&[]);
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }
}
