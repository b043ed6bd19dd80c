//! Text-to-speech payloads.
//!
//! `SpeechRequest` is what browsers post to `/api/tts`; `SynthesisRequest`
//! is the body forwarded to the speech vendor.

use serde::{Deserialize, Serialize};

/// Voice tuning sent with every synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    #[serde(default)]
    pub style: f32,
    #[serde(default = "default_use_speaker_boost")]
    pub use_speaker_boost: bool,
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.8
}

fn default_use_speaker_boost() -> bool {
    true
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: 0.0,
            use_speaker_boost: default_use_speaker_boost(),
        }
    }
}

/// Body accepted by the speech proxy endpoint.
///
/// Browsers have sent the voice as both `voice_id` and `voiceId`; either is
/// accepted, and a missing voice falls back to the configured default.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default, alias = "voiceId")]
    pub voice_id: Option<String>,
}

/// Successful proxy response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechResponse {
    /// Playable `data:` URL with the synthesized audio.
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
}

/// Body sent to the vendor's streaming synthesis endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub model_id: &'a str,
    pub voice_settings: &'a VoiceSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_settings_defaults() {
        let settings = VoiceSettings::default();
        assert!((settings.stability - 0.5).abs() < f32::EPSILON);
        assert!((settings.similarity_boost - 0.8).abs() < f32::EPSILON);
        assert!(settings.style.abs() < f32::EPSILON);
        assert!(settings.use_speaker_boost);
    }

    #[test]
    fn test_speech_request_accepts_both_voice_spellings() {
        let snake: SpeechRequest =
            serde_json::from_str(r#"{"text":"hi","voice_id":"abc"}"#).unwrap();
        assert_eq!(snake.voice_id.as_deref(), Some("abc"));

        let camel: SpeechRequest =
            serde_json::from_str(r#"{"text":"hi","voiceId":"xyz"}"#).unwrap();
        assert_eq!(camel.voice_id.as_deref(), Some("xyz"));

        let none: SpeechRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert!(none.voice_id.is_none());
    }

    #[test]
    fn test_speech_response_uses_camel_case_key() {
        let resp = SpeechResponse {
            audio_url: "data:audio/mpeg;base64,AA==".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["audioUrl"], "data:audio/mpeg;base64,AA==");
    }

    #[test]
    fn test_synthesis_request_shape() {
        let settings = VoiceSettings::default();
        let body = SynthesisRequest {
            text: "Bonjour",
            model_id: "eleven_turbo_v2",
            voice_settings: &settings,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model_id"], "eleven_turbo_v2");
        assert_eq!(json["voice_settings"]["use_speaker_boost"], true);
    }
}
