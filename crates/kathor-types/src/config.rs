//! Configuration types for Kathor.
//!
//! `KathorConfig` represents the top-level `config.toml` in the data
//! directory. Every section and field has a default, so an empty file (or no
//! file at all) yields a working configuration. API keys are not part of this
//! file; they are read from the environment by `kathor-infra`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tts::VoiceSettings;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KathorConfig {
    #[serde(default)]
    pub soul: SoulConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Persona settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoulConfig {
    /// Name the prompts use for the soul.
    #[serde(default = "default_soul_name")]
    pub name: String,
    /// Markdown file replacing the built-in persona blueprint.
    #[serde(default)]
    pub persona_path: Option<PathBuf>,
}

fn default_soul_name() -> String {
    "Kathor".to_string()
}

impl Default for SoulConfig {
    fn default() -> Self {
        Self {
            name: default_soul_name(),
            persona_path: None,
        }
    }
}

/// Language-model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model used by the mental processes.
    #[serde(default = "default_model")]
    pub model: String,
    /// Model for steps that don't name one (subprocesses, apology check).
    /// Falls back to `model`.
    #[serde(default)]
    pub utility_model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.7
}

impl LlmConfig {
    /// Model for steps that run without an explicit model.
    pub fn utility_model(&self) -> &str {
        self.utility_model.as_deref().unwrap_or(&self.model)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_model(),
            utility_model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Working-memory bounds and subprocess toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Compression runs once working memory holds more entries than this.
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: usize,
    /// Most recent entries kept verbatim by compression.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
    /// Refresh the notes about the user after each turn.
    #[serde(default = "default_learn_about_user")]
    pub learn_about_user: bool,
}

fn default_compression_threshold() -> usize {
    15
}

fn default_keep_recent() -> usize {
    8
}

fn default_learn_about_user() -> bool {
    true
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            compression_threshold: default_compression_threshold(),
            keep_recent: default_keep_recent(),
            learn_about_user: default_learn_about_user(),
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,
    #[serde(default = "default_tts_model_id")]
    pub model_id: String,
    /// Voice used when a request does not name one.
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub voice_settings: VoiceSettings,
}

fn default_tts_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_tts_model_id() -> String {
    "eleven_monolingual_v1".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tts_base_url(),
            model_id: default_tts_model_id(),
            voice_id: None,
            voice_settings: VoiceSettings::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}
