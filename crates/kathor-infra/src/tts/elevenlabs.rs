//! ElevenLabs streaming text-to-speech client.
//!
//! Posts text to `/v1/text-to-speech/{voice}/stream`, collects the MP3
//! bytes, and can wrap them in a `data:` URL browsers can play directly.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};

use kathor_types::config::TtsConfig;
use kathor_types::error::TtsError;
use kathor_types::tts::{SynthesisRequest, VoiceSettings};

const AUDIO_MIME: &str = "audio/mpeg";

/// Wrap MP3 bytes in a playable `data:` URL.
pub fn audio_data_url(bytes: &[u8]) -> String {
    format!("data:{AUDIO_MIME};base64,{}", STANDARD.encode(bytes))
}

/// Client for the ElevenLabs synthesis API.
pub struct ElevenLabsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model_id: String,
    default_voice: Option<String>,
    voice_settings: VoiceSettings,
}

impl ElevenLabsClient {
    /// Build a client from the `[tts]` section.
    ///
    /// A missing key is reported per request, so the HTTP server can still
    /// start without speech configured.
    pub fn new(config: &TtsConfig, api_key: Option<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model_id: config.model_id.clone(),
            default_voice: config.voice_id.clone(),
            voice_settings: config.voice_settings.clone(),
        }
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Streaming endpoint for `voice_id`.
    pub fn endpoint(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{voice_id}/stream", self.base_url)
    }

    /// Synthesize `text` and return the raw MP3 bytes.
    ///
    /// `voice_id` falls back to the configured default voice.
    #[tracing::instrument(name = "tts_synthesize", skip(self, text), fields(chars = text.len()))]
    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<Vec<u8>, TtsError> {
        let api_key = self.api_key.as_ref().ok_or(TtsError::MissingApiKey)?;
        let voice = voice_id
            .filter(|v| !v.is_empty())
            .or(self.default_voice.as_deref())
            .ok_or(TtsError::MissingVoice)?;

        let body = SynthesisRequest {
            text,
            model_id: &self.model_id,
            voice_settings: &self.voice_settings,
        };

        let response = self
            .http
            .post(self.endpoint(voice))
            .header("xi-api-key", api_key.expose_secret())
            .header(ACCEPT, AUDIO_MIME)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "speech vendor rejected request");
            return Err(TtsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let mut audio = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| TtsError::Request(e.to_string()))?;
            audio.extend_from_slice(&chunk);
        }

        tracing::debug!(bytes = audio.len(), voice, "speech synthesized");
        Ok(audio)
    }

    /// Synthesize `text` and return it as a `data:audio/mpeg;base64,...` URL.
    pub async fn synthesize_data_url(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<String, TtsError> {
        let audio = self.synthesize(text, voice_id).await?;
        Ok(audio_data_url(&audio))
    }
}
