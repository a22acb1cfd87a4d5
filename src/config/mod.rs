use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use anyhow::{Context, Result};

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_database_url() -> String {
    "sqlite://vidhub.db".to_string()
}

fn default_logging_format() -> String {
    "json".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// TCP address the HTTP server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// sqlx connection string for the channel store.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Root directory for per-request download scratch space.
    /// Defaults to a `vidhub` directory under the system temp dir.
    #[serde(default)]
    pub downloads_dir: Option<PathBuf>,

    /// YouTube Data API v3 key. Required only for channel video listing.
    /// The `YT_API_KEY` environment variable takes precedence.
    #[serde(default)]
    pub youtube_api_key: Option<String>,

    /// "json" or "pretty".
    #[serde(default = "default_logging_format")]
    pub logging_format: String,

    /// Comma-separated list of allowed CORS origins. Unset means wildcard.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_url: default_database_url(),
            downloads_dir: None,
            youtube_api_key: None,
            logging_format: default_logging_format(),
            cors_allowed_origins: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path))?;
        Ok(config)
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging_format
    }

    pub fn get_youtube_api_key(&self) -> Option<String> {
        std::env::var("YT_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.youtube_api_key.clone())
    }

    pub fn get_downloads_dir(&self) -> PathBuf {
        self.downloads_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("vidhub"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert_eq!(config.database_url, "sqlite://vidhub.db");
        assert_eq!(config.get_logging_format(), "json");
        assert!(config.downloads_dir.is_none());
        assert!(config.cors_allowed_origins.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            bind_address = "127.0.0.1:9000"
            logging_format = "pretty"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.get_logging_format(), "pretty");
        // Unset fields fall back to defaults
        assert_eq!(config.database_url, "sqlite://vidhub.db");
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            bind_address = "0.0.0.0:3000"
            database_url = "sqlite:///var/lib/vidhub/app.db"
            downloads_dir = "/var/tmp/vidhub"
            youtube_api_key = "test-key"
            logging_format = "json"
            cors_allowed_origins = "https://example.com,https://example.org"
            "#,
        )
        .unwrap();
        assert_eq!(config.downloads_dir, Some(PathBuf::from("/var/tmp/vidhub")));
        assert_eq!(config.youtube_api_key.as_deref(), Some("test-key"));
        assert_eq!(
            config.cors_allowed_origins.as_deref(),
            Some("https://example.com,https://example.org")
        );
    }

    #[test]
    fn test_downloads_dir_fallback() {
        let config = Config::default();
        assert!(config.get_downloads_dir().ends_with("vidhub"));
    }
}
