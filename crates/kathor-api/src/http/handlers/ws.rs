//! WebSocket handler for one soul's event stream and inbound perceptions.
//!
//! `GET /api/v1/souls/{id}/ws` upgrades to a WebSocket. Once connected, the
//! handler:
//!
//! - **Forwards events:** subscribes to the engine's event bus and pushes
//!   every [`SoulEvent`] of this soul to the client as a JSON text frame.
//! - **Receives commands:** parses incoming text frames as [`WsCommand`];
//!   `said` and `honked` join the soul's perception queue, `ping` is
//!   answered with `{"type":"pong"}`.
//!
//! Disconnecting does **not** cancel a running turn. Only a reset or
//! deleting the soul does.
//!
//! [`SoulEvent`]: kathor_types::event::SoulEvent

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use kathor_core::soul::SoulEngine;
use kathor_types::error::EngineError;
use kathor_types::perception::Perception;
use kathor_types::soul::SoulId;

use super::parse_soul_id;
use super::perception::DEFAULT_USER_NAME;
use crate::http::error::AppError;
use crate::state::AppState;

/// Incoming command from a WebSocket client.
///
/// Unknown or malformed messages are logged and ignored.
#[derive(Debug, PartialEq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    /// A chat message.
    Said {
        content: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// The HONK button.
    Honked {
        #[serde(default)]
        name: Option<String>,
    },
    /// Keep-alive ping. Server responds with `{"type":"pong"}`.
    Ping,
}

impl WsCommand {
    fn into_perception(self) -> Option<Perception> {
        let name = |n: Option<String>| n.unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
        match self {
            WsCommand::Said { content, .. } if content.trim().is_empty() => None,
            WsCommand::Said { content, name: n } => Some(Perception::said(name(n), content)),
            WsCommand::Honked { name: n } => Some(Perception::honked(name(n))),
            WsCommand::Ping => None,
        }
    }
}

/// Upgrade to a WebSocket bound to one soul.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let soul_id = parse_soul_id(&id)?;
    if !state.engine.contains(soul_id) {
        return Err(EngineError::SoulNotFound(soul_id).into());
    }
    let engine = Arc::clone(&state.engine);
    Ok(ws.on_upgrade(move |socket| handle_ws_connection(socket, engine, soul_id)))
}

/// Multiplex bus events and client frames in one task, so pings can be
/// answered on the same sender.
async fn handle_ws_connection(socket: WebSocket, engine: Arc<SoulEngine>, soul_id: SoulId) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut event_rx = engine.subscribe();

    tracing::debug!(soul_id = %soul_id, "WebSocket connected");

    loop {
        tokio::select! {
            event_result = event_rx.recv() => {
                match event_result {
                    Ok(event) if event.soul_id() == soul_id => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => tracing::warn!("Failed to serialize SoulEvent: {err}"),
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(soul_id = %soul_id, skipped = n, "WebSocket subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        if process_command(&text, &mut ws_sender, &engine, soul_id).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    // Binary and protocol frames are handled by axum
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!(soul_id = %soul_id, "WebSocket connection closed");
}

/// Parse and act on one client frame. Errors only when the socket is gone.
async fn process_command(
    text: &str,
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    engine: &Arc<SoulEngine>,
    soul_id: SoulId,
) -> Result<(), axum::Error> {
    let cmd: WsCommand = match serde_json::from_str(text) {
        Ok(cmd) => cmd,
        Err(err) => {
            tracing::warn!(raw = %text, error = %err, "Ignoring malformed WebSocket command");
            return Ok(());
        }
    };

    if cmd == WsCommand::Ping {
        let pong = serde_json::json!({ "type": "pong" }).to_string();
        return ws_sender.send(Message::Text(pong.into())).await;
    }

    match cmd.into_perception() {
        Some(perception) => {
            if let Err(e) = engine.enqueue(soul_id, perception) {
                tracing::warn!(soul_id = %soul_id, error = %e, "perception dropped");
            }
        }
        None => tracing::debug!("Ignoring empty message"),
    }
    Ok(())
}
