//! Connection settings for an OpenAI-compatible chat completions endpoint.

use secrecy::SecretString;

use librarian_types::config::LlmConfig;

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name, derived from the base URL host.
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Default model when a request leaves it empty.
    pub model: String,
}

impl OpenAiCompatConfig {
    pub fn from_llm_config(config: &LlmConfig, api_key: SecretString) -> Self {
        Self {
            provider_name: provider_name_for(&config.base_url),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        }
    }
}

/// Short provider label for logs: "openai" for the official endpoint,
/// otherwise the URL host.
pub fn provider_name_for(base_url: &str) -> String {
    let host = base_url
        .split("://")
        .nth(1)
        .unwrap_or(base_url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    match host {
        "api.openai.com" => "openai".to_string(),
        "" => "openai-compatible".to_string(),
        other => other.to_string(),
    }
}
