//! Speech synthesis adapters.

pub mod elevenlabs;

pub use elevenlabs::{ElevenLabsClient, audio_data_url};
