//! LLM provider implementations.
//!
//! Contains the concrete implementation of the [`LlmProvider`] trait
//! defined in `kathor-core` and a factory ([`create_provider`]) that builds
//! it from the `[llm]` configuration section.
//!
//! [`LlmProvider`]: kathor_core::llm::LlmProvider

pub mod openai_compat;

use secrecy::SecretString;

use kathor_core::llm::BoxLlmProvider;
use kathor_types::config::LlmConfig;
use kathor_types::llm::{CompletionRequest, LlmError, Message, MessageRole};

use self::openai_compat::OpenAiCompatibleProvider;

/// Create a [`BoxLlmProvider`] from the `[llm]` section.
///
/// # Errors
///
/// Returns `AuthenticationFailed` when no API key is available.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
    let provider =
        OpenAiCompatibleProvider::new(openai_compat::config::from_llm_config(config, key));
    tracing::debug!(base_url = %config.base_url, model = %config.model, "LLM provider created");
    Ok(BoxLlmProvider::new(provider))
}

/// Verify connectivity with a minimal completion request.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: String::new(), // Provider uses its configured default
        messages: vec![Message {
            role: MessageRole::User,
            content: "Hello".to_string(),
        }],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
        stream: false,
        stop_sequences: None,
    };
    provider.complete(&request).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_openai() {
        let provider =
            create_provider(&LlmConfig::default(), Some(SecretString::from("sk-test"))).unwrap();
        assert_eq!(provider.name(), "openai");
        assert!(provider.capabilities().streaming);
    }

    #[test]
    fn test_create_provider_custom_base_url() {
        let config = LlmConfig {
            base_url: "https://llm.example.com/v1".to_string(),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config, Some(SecretString::from("key"))).unwrap();
        assert_eq!(provider.name(), "openai_compatible");
    }

    #[test]
    fn test_create_provider_missing_key() {
        match create_provider(&LlmConfig::default(), None) {
            Err(LlmError::AuthenticationFailed) => {}
            Err(other) => panic!("Expected AuthenticationFailed, got: {other}"),
            Ok(_) => panic!("Expected error but got Ok"),
        }
    }
}
