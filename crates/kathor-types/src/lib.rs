//! Shared domain types for Kathor.
//!
//! This crate contains the data shapes passed between the soul engine, the
//! LLM adapters and the HTTP/CLI surfaces: working-memory entries,
//! perceptions, outbound soul events, the process pointer, configuration,
//! text-to-speech payloads, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod memory;
pub mod perception;
pub mod process;
pub mod soul;
pub mod tts;
