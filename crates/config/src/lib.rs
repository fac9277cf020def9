//! Configuration loading, validation, and management for hubpilot.
//!
//! Loads configuration from `~/.hubpilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hubpilot/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model provider settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Turn loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Web search backend settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Conversation, inventory and blob storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider name; only "anthropic" is built in
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP timeout for one model call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> String {
    "anthropic".into()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model round trips per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Number of prior messages sent with each turn
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Replace the built-in sales-assistant instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_max_iterations() -> u32 {
    5
}
fn default_history_window() -> usize {
    20
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_window: default_history_window(),
            system_prompt_override: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search API key; web search reports itself unusable without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_search_url")]
    pub base_url: String,

    #[serde(default = "default_search_model")]
    pub model: String,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_url() -> String {
    "https://api.perplexity.ai".into()
}
fn default_search_model() -> String {
    "sonar".into()
}
fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_search_url(),
            model: default_search_model(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "file" (JSON under `data_dir`) or "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Directory for conversation state; defaults to `~/.hubpilot/data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Directory for generated files and uploads; defaults to `~/.hubpilot/files`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_dir: Option<PathBuf>,

    /// JSON file mapping hub id → publications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_file: Option<PathBuf>,
}

fn default_storage_backend() -> String {
    "file".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            data_dir: None,
            blob_dir: None,
            inventory_file: None,
        }
    }
}

impl StorageConfig {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("data"))
    }

    pub fn resolved_blob_dir(&self) -> PathBuf {
        self.blob_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("files"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.hubpilot/config.toml).
    ///
    /// Also checks environment variables:
    /// - `HUBPILOT_API_KEY`, then `ANTHROPIC_API_KEY` for the model
    /// - `PERPLEXITY_API_KEY` for web search
    /// - `HUBPILOT_MODEL` to override the model
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.model.api_key.is_none() {
            self.model.api_key = lookup("HUBPILOT_API_KEY").or_else(|| lookup("ANTHROPIC_API_KEY"));
        }
        if self.search.api_key.is_none() {
            self.search.api_key = lookup("PERPLEXITY_API_KEY");
        }
        if let Some(model) = lookup("HUBPILOT_MODEL") {
            self.model.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hubpilot")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 1.0".into(),
            ));
        }
        if self.model.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "model.max_tokens must be > 0".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be >= 1".into(),
            ));
        }
        if self.agent.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_window must be >= 1".into(),
            ));
        }
        if !matches!(self.storage.backend.as_str(), "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "storage.backend must be \"file\" or \"memory\", got \"{}\"",
                self.storage.backend
            )));
        }
        Ok(())
    }

    /// Check if a model API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.model.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.provider, "anthropic");
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.gateway.port, 8787);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.model, config.model.model);
        assert_eq!(parsed.agent.history_window, config.agent.history_window);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.model.temperature = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_storage_backend_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = "postgres".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model.provider, "anthropic");
    }

    #[test]
    fn load_from_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[agent]
max_iterations = 3

[search]
api_key = "pplx-test"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.history_window, 20);
        assert_eq!(config.search.api_key.as_deref(), Some("pplx-test"));
        assert_eq!(config.search.model, "sonar");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\nmax_iterations = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_fill_missing_keys() {
        let env: HashMap<&str, &str> = [
            ("ANTHROPIC_API_KEY", "sk-ant-env"),
            ("PERPLEXITY_API_KEY", "pplx-env"),
            ("HUBPILOT_MODEL", "claude-haiku"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.model.api_key.as_deref(), Some("sk-ant-env"));
        assert_eq!(config.search.api_key.as_deref(), Some("pplx-env"));
        assert_eq!(config.model.model, "claude-haiku");
    }

    #[test]
    fn env_does_not_override_configured_key() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("from-file".into());
        config.apply_env(|_| Some("from-env".into()));
        assert_eq!(config.model.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-ant-secret".into());
        config.search.api_key = Some("pplx-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(!debug.contains("pplx-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("claude-sonnet-4"));
        assert!(toml_str.contains("max_iterations"));
    }
}
