//! HTTP layer for Kathor.
//!
//! Axum-based REST API at `/api/v1/` with an envelope response format, a
//! per-soul WebSocket event stream, the speech proxy at `/api/tts`, and the
//! embedded chat page at `/`.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
