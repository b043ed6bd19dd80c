//! Presentation model shared by the chat surfaces.

pub mod transcript;

pub use transcript::{Transcript, TranscriptEntry, TranscriptUpdate};
