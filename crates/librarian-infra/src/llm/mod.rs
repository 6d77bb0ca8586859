//! LLM provider construction.
//!
//! Builds the generation backend from [`LlmConfig`]: resolves the API key
//! from the configured environment variable, creates the OpenAI-compatible
//! client and wraps it with timeout and backoff.

pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use librarian_core::llm::box_provider::BoxLlmProvider;
use librarian_core::llm::retry::{RetryPolicy, RetryingProvider};
use librarian_types::config::{LlmConfig, RetryConfig};
use librarian_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Read the API key from the environment variable named in the config.
pub fn resolve_api_key(config: &LlmConfig) -> Result<SecretString, LlmError> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(SecretString::from(key.trim().to_string())),
        _ => {
            tracing::error!(env = %config.api_key_env, "API key environment variable not set");
            Err(LlmError::AuthenticationFailed)
        }
    }
}

/// Create the provider used for all generation, with retry and timeout.
pub fn create_provider(config: &LlmConfig, retry: &RetryConfig) -> Result<BoxLlmProvider, LlmError> {
    let api_key = resolve_api_key(config)?;
    Ok(create_provider_with_key(config, retry, api_key))
}

pub fn create_provider_with_key(
    config: &LlmConfig,
    retry: &RetryConfig,
    api_key: SecretString,
) -> BoxLlmProvider {
    let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_llm_config(config, api_key));
    tracing::info!(base_url = %config.base_url, model = %config.model, "generation provider configured");
    BoxLlmProvider::new(RetryingProvider::new(
        provider,
        RetryPolicy::from_config(retry),
        Duration::from_secs(config.timeout_secs),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use librarian_core::llm::provider::LlmProvider;

    #[test]
    fn test_missing_api_key_env_fails() {
        let config = LlmConfig {
            api_key_env: "LIBRARIAN_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config, &RetryConfig::default()),
            Err(LlmError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_provider_named_after_base_url() {
        let config = LlmConfig {
            base_url: "http://localhost:11434/v1".to_string(),
            ..Default::default()
        };
        let provider =
            create_provider_with_key(&config, &RetryConfig::default(), SecretString::from("k"));
        assert_eq!(provider.name(), "localhost");
    }
}
