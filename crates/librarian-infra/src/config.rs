//! Configuration loader for the Smart Librarian.
//!
//! Reads `config.toml` from the data directory (`~/.librarian/` unless
//! `LIBRARIAN_DATA_DIR` says otherwise) and deserializes it into
//! [`LibrarianConfig`]. Falls back to defaults when the file is missing or
//! malformed.

use std::path::{Path, PathBuf};

use librarian_types::config::LibrarianConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LIBRARIAN_DATA_DIR";

/// Resolve the data directory: `LIBRARIAN_DATA_DIR`, else `~/.librarian`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".librarian"),
    }
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`LibrarianConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config; absent keys take their defaults.
pub async fn load_config(data_dir: &Path) -> LibrarianConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return LibrarianConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return LibrarianConfig::default();
        }
    };

    match toml::from_str::<LibrarianConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            LibrarianConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.retrieval.top_k, 6);
    }

    #[tokio::test]
    async fn load_config_partial_toml_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[server]
port = 9100

[llm]
model = "gpt-4.1-mini"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.catalog.chunk_size, 1200);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn resolve_data_dir_ends_with_librarian_by_default() {
        if std::env::var_os(DATA_DIR_ENV).is_none() {
            assert!(resolve_data_dir().ends_with(".librarian"));
        }
    }
}
