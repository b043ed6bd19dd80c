//! Souls: the runtime shared by all conversations, per-conversation state,
//! and the engine that runs turns.

pub mod blueprint;
pub mod engine;
pub mod runtime;
pub mod state;

pub use engine::{ProcessOutcome, SoulEngine};
pub use runtime::SoulRuntime;
pub use state::{SoulSession, SoulState};
