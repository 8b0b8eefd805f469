//! Configuration loading from quotebot.toml.

use runtime::RoutingRules;
use runtime::providers::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Model host settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Keyword and ticker sets for the query classifier.
    #[serde(default)]
    pub routing: RoutingRules,

    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Backend provider configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Provider name (currently only "ollama" supported).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Tool discovery settings.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoveryConfig {
    /// Seconds to reuse a tool list; 0 refetches on every tool-routed query.
    #[serde(default)]
    pub ttl_secs: u64,
}

impl DiscoveryConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.backend.provider != "ollama" {
            return Err(ConfigError::UnsupportedProvider(config.backend.provider));
        }
        Ok(config)
    }

    /// Pick the model name: flag, then environment, then file.
    pub fn resolve_model(&self, flag: Option<&str>, env: Option<String>) -> String {
        flag.map(str::to_string)
            .or(env.filter(|m| !m.trim().is_empty()))
            .unwrap_or_else(|| self.backend.model.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("unsupported backend provider '{0}' (only \"ollama\" is available)")]
    UnsupportedProvider(String),
}
