//! Infrastructure layer for Kathor.
//!
//! Implements the `LlmProvider` port from `kathor-core` against
//! OpenAI-compatible APIs, proxies speech synthesis to ElevenLabs, and loads
//! configuration, secrets and the persona from disk and the environment.

pub mod config;
pub mod llm;
pub mod tts;
