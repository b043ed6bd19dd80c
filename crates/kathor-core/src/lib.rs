//! Soul engine and business logic for Kathor.
//!
//! This crate defines the `LlmProvider` port that the infrastructure layer
//! implements, the cognitive steps built on it, the mental processes that
//! chain those steps, and the engine that runs conversations. It depends
//! only on `kathor-types` -- never on `kathor-infra` or any network crate.

pub mod chat;
pub mod cognitive;
pub mod event;
pub mod llm;
pub mod memory;
pub mod process;
pub mod soul;
