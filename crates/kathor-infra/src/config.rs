//! Configuration loader for Kathor.
//!
//! Reads `config.toml` from the data directory (`~/.kathor/` in production)
//! and deserializes it into [`KathorConfig`]. Falls back to defaults when the
//! file is missing or malformed. Environment variables override selected
//! fields, and API keys come from the environment only.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use thiserror::Error;

use kathor_core::soul::blueprint::DEFAULT_PERSONA;
use kathor_types::config::{KathorConfig, SoulConfig};

/// Overrides the data directory.
pub const ENV_DATA_DIR: &str = "KATHOR_DATA_DIR";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "KATHOR_MODEL";
pub const ENV_ELEVEN_LABS_API_KEY: &str = "ELEVEN_LABS_API_KEY";
pub const ENV_ELEVEN_LABS_MODEL_ID: &str = "ELEVEN_LABS_MODEL_ID";
pub const ENV_ELEVEN_LABS_VOICE_ID: &str = "ELEVEN_LABS_VOICE_ID";

/// Errors from loading files referenced by the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read persona file {path}: {source}")]
    PersonaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("persona file {0} is empty")]
    EmptyPersona(PathBuf),
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `KATHOR_DATA_DIR` environment variable
/// 2. `~/.kathor`
/// 3. `./.kathor`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".kathor");
    }

    PathBuf::from(".kathor")
}

/// Path of the configuration file inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Load configuration from `{data_dir}/config.toml` and apply environment
/// overrides.
pub async fn load_config(data_dir: &Path) -> KathorConfig {
    let mut config = load_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load `{data_dir}/config.toml` without environment overrides.
///
/// - If the file does not exist, returns [`KathorConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_config_file(data_dir: &Path) -> KathorConfig {
    let path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return KathorConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return KathorConfig::default();
        }
    };

    match toml::from_str::<KathorConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            KathorConfig::default()
        }
    }
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are ignored.
pub fn apply_env_overrides(config: &mut KathorConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(base_url) = get(ENV_OPENAI_BASE_URL) {
        config.llm.base_url = base_url;
    }
    if let Some(model) = get(ENV_MODEL) {
        config.llm.model = model;
    }
    if let Some(model_id) = get(ENV_ELEVEN_LABS_MODEL_ID) {
        config.tts.model_id = model_id;
    }
    if let Some(voice_id) = get(ENV_ELEVEN_LABS_VOICE_ID) {
        config.tts.voice_id = Some(voice_id);
    }
}

/// API keys read from the environment.
pub struct Secrets {
    pub openai_api_key: Option<SecretString>,
    pub eleven_labs_api_key: Option<SecretString>,
}

impl Secrets {
    /// Read secrets from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read secrets through `lookup`. Missing and empty values become `None`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secret = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from)
        };
        Self {
            openai_api_key: secret(ENV_OPENAI_API_KEY),
            eleven_labs_api_key: secret(ENV_ELEVEN_LABS_API_KEY),
        }
    }
}

/// Load the persona blueprint.
///
/// Without `persona_path` the built-in Kathor persona is used. A configured
/// path that cannot be read is an error rather than a silent fallback.
pub async fn load_persona(soul: &SoulConfig) -> Result<String, ConfigError> {
    let Some(path) = &soul.persona_path else {
        return Ok(DEFAULT_PERSONA.to_string());
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::PersonaRead {
            path: path.clone(),
            source,
        })?;
    if content.trim().is_empty() {
        return Err(ConfigError::EmptyPersona(path.clone()));
    }
    tracing::debug!(path = %path.display(), "Loaded persona");
    Ok(content)
}
