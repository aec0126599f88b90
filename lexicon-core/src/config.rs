use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::logging::LoggingConfig;

pub const CONFIG_ENV: &str = "LEXICON_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "lexicon.json";

fn default_store_path() -> PathBuf {
    PathBuf::from("vocabulary.json")
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_items_per_batch() -> u32 {
    75
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    800
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoreConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            generation: GenerationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Items requested from the provider per batch.
    #[serde(default = "default_items_per_batch")]
    pub items_per_batch: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Replaces the provider's API host, e.g. for a proxy or gateway.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            items_per_batch: default_items_per_batch(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            base_url: None,
        }
    }
}

impl CoreConfig {
    /// Reads a config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path).map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;

        serde_json::from_str(&data).map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
    }

    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = CoreConfig::load(&dir.path().join("nope.json")).unwrap();

        assert_eq!(cfg.store_path, PathBuf::from("vocabulary.json"));
        assert_eq!(cfg.generation.items_per_batch, 75);
        assert_eq!(cfg.generation.provider, "gemini");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(
            &path,
            r#"{ "generation": { "provider": "openai", "model": "gpt-4o-mini" }, "logging": { "level": "debug", "format": "json" } }"#,
        )
        .unwrap();

        let cfg = CoreConfig::load(&path).unwrap();
        assert_eq!(cfg.generation.provider, "openai");
        assert_eq!(cfg.generation.max_retries, 3);
        assert_eq!(cfg.generation.base_url, None);
        assert_eq!(cfg.logging.level, LogLevel::Debug);
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn base_url_override_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(&path, r#"{ "generation": { "base_url": "http://127.0.0.1:8080" } }"#).unwrap();

        let cfg = CoreConfig::load(&path).unwrap();
        assert_eq!(cfg.generation.base_url.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(cfg.generation.provider, "gemini");
    }

    #[test]
    fn invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(&path, "{ store_path: ").unwrap();

        assert!(matches!(CoreConfig::load(&path), Err(CoreError::Config(_))));
    }
}
