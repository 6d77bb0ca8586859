//! Configuration types for Smart Librarian.
//!
//! `LibrarianConfig` represents the top-level `config.toml` in the data
//! directory. Every field has a default, so a partial (or absent) file works.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.librarian/config.toml`. All sections have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrarianConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub guard: GuardConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Generation provider settings (any OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_stream_max_tokens")]
    pub stream_max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    500
}

fn default_stream_max_tokens() -> u32 {
    700
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stream_max_tokens: default_stream_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Backoff settings for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    800
}

fn default_multiplier() -> f64 {
    1.6
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages handed to the generator per turn.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Page size when listing the whole catalog.
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,
}

fn default_top_k() -> usize {
    6
}

fn default_list_page_size() -> usize {
    1000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            list_page_size: default_list_page_size(),
        }
    }
}

/// Catalog source file and ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog file. Relative paths resolve against the working directory.
    #[serde(default = "default_catalog_path")]
    pub path: String,
    /// LanceDB table holding the catalog chunks.
    #[serde(default = "default_table")]
    pub table: String,
    /// Seconds between catalog modification checks. Zero disables the task.
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_catalog_path() -> String {
    "data/summaries.json".to_string()
}

fn default_table() -> String {
    "books".to_string()
}

fn default_reconcile_interval_secs() -> u64 {
    600
}

fn default_chunk_size() -> usize {
    1200
}

fn default_chunk_overlap() -> usize {
    120
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            table: default_table(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Input guard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    /// Case-insensitive regular expressions; a match rejects the message.
    #[serde(default = "default_blocked_patterns")]
    pub blocked_patterns: Vec<String>,
}

fn default_max_message_chars() -> usize {
    4000
}

fn default_blocked_patterns() -> Vec<String> {
    vec![
        r"ignore (all )?(the )?(previous|prior|above) instructions".to_string(),
        r"disregard (all )?(the )?(previous|prior|above) instructions".to_string(),
        r"ignora (toate )?instructiunile".to_string(),
        r"reveal (your|the) system prompt".to_string(),
    ]
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            blocked_patterns: default_blocked_patterns(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = LibrarianConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.llm.stream_max_tokens, 700);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 800);
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.catalog.chunk_size, 1200);
        assert_eq!(config.catalog.chunk_overlap, 120);
        assert_eq!(config.catalog.reconcile_interval_secs, 600);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: LibrarianConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.catalog.table, "books");
        assert!(!config.guard.blocked_patterns.is_empty());
    }

    #[test]
    fn test_deserialize_partial_section() {
        let toml_str = r#"
[server]
port = 9090

[llm]
model = "gpt-4.1-mini"
temperature = 0.0

[catalog]
path = "/srv/books.json"
"#;
        let config: LibrarianConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.catalog.path, "/srv/books.json");
        assert_eq!(config.catalog.table, "books");
    }
}
