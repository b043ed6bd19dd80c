//! LLM provider abstractions for Kathor.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ScriptedProvider`: replayed replies for tests (behind `testing`)

pub mod box_provider;
pub mod provider;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use box_provider::BoxLlmProvider;
pub use provider::LlmProvider;
