//! Configuration for the OpenAI-compatible provider.

use secrecy::SecretString;

use kathor_types::config::LlmConfig;
use kathor_types::llm::ProviderCapabilities;

/// Configuration used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openai").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when a request leaves its model empty.
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

/// OpenAI default configuration.
///
/// Base URL: `https://api.openai.com/v1`; 128K context, 4K output.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: "https://api.openai.com/v1".into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            streaming: true,
            max_context_tokens: 128_000,
            max_output_tokens: 4_096,
        },
    }
}

/// Configuration from the `[llm]` section.
///
/// Any base URL other than OpenAI's is reported as a generic
/// "openai_compatible" provider.
pub fn from_llm_config(llm: &LlmConfig, api_key: SecretString) -> OpenAiCompatConfig {
    let mut config = openai_defaults(api_key, &llm.model);
    let base_url = llm.base_url.trim_end_matches('/');
    if base_url != config.base_url {
        config.provider_name = "openai_compatible".into();
        config.base_url = base_url.to_string();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_openai() {
        let config = from_llm_config(&LlmConfig::default(), SecretString::from("sk-test"));
        assert_eq!(config.provider_name, "openai");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4-turbo");
    }

    #[test]
    fn custom_base_url_is_generic() {
        let llm = LlmConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            ..LlmConfig::default()
        };
        let config = from_llm_config(&llm, SecretString::from("unused"));
        assert_eq!(config.provider_name, "openai_compatible");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
    }
}
