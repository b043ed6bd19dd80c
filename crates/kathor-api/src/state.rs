//! Application state wiring the engine and adapters together.
//!
//! AppState holds the concrete instances used by both the CLI chat and the
//! REST/WebSocket API: one soul engine (shared by every conversation), the
//! speech client and the effective configuration.

use std::sync::Arc;

use anyhow::Context;

use kathor_core::soul::{SoulEngine, SoulRuntime};
use kathor_infra::config::{Secrets, load_config, load_persona, resolve_data_dir};
use kathor_infra::llm::create_provider;
use kathor_infra::tts::ElevenLabsClient;
use kathor_types::config::KathorConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SoulEngine>,
    pub tts: Arc<ElevenLabsClient>,
    pub config: Arc<KathorConfig>,
}

impl AppState {
    /// Load configuration and secrets, then build the engine and adapters.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let secrets = Secrets::from_env();
        let persona = load_persona(&config.soul).await?;

        let provider = create_provider(&config.llm, secrets.openai_api_key).map_err(|e| {
            anyhow::anyhow!("{e}: set OPENAI_API_KEY to an API key for {}", config.llm.base_url)
        })?;

        let runtime = SoulRuntime::new(provider, &config, persona);
        let tts = ElevenLabsClient::new(&config.tts, secrets.eleven_labs_api_key);
        if !tts.is_configured() {
            tracing::warn!("ELEVEN_LABS_API_KEY not set, speech synthesis will fail");
        }

        tracing::info!(
            data_dir = %data_dir.display(),
            soul = %config.soul.name,
            model = %config.llm.model,
            "application state initialized"
        );

        Ok(Self::new(SoulEngine::new(runtime), tts, config))
    }

    pub fn new(engine: SoulEngine, tts: ElevenLabsClient, config: KathorConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            tts: Arc::new(tts),
            config: Arc::new(config),
        }
    }
}
