use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LensError, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Namespace key the gallery is persisted under.
pub const HISTORY_NAMESPACE: &str = "banana_lens_v2";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub history_path: PathBuf,
    pub output_dir: PathBuf,
    pub history_key: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout = env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        GeminiConfig {
            api_key,
            base_url,
            timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| LensError::ConfigError("GEMINI_API_KEY is not set".into()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini: GeminiConfig::default(),
            history_path: PathBuf::from("banana_lens_history.json"),
            output_dir: PathBuf::from("."),
            history_key: HISTORY_NAMESPACE.to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Config::default();
        let history_path = env::var("BANANA_LENS_HISTORY")
            .map(PathBuf::from)
            .unwrap_or(defaults.history_path);
        let output_dir = env::var("BANANA_LENS_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        Config {
            gemini: GeminiConfig::from_env(),
            history_path,
            output_dir,
            history_key: defaults.history_key,
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.history_key, "banana_lens_v2");
        assert_eq!(config.gemini.base_url, DEFAULT_BASE_URL);
        assert!(config.gemini.require_api_key().is_err());
    }

    #[test]
    fn test_builders() {
        let config = Config::new()
            .with_gemini(GeminiConfig::new().with_api_key("k").with_base_url("http://localhost:9"))
            .with_history_path("/tmp/h.json")
            .with_output_dir("/tmp/out");
        assert_eq!(config.gemini.require_api_key().unwrap(), "k");
        assert_eq!(config.gemini.base_url, "http://localhost:9");
        assert_eq!(config.history_path, PathBuf::from("/tmp/h.json"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }
}
