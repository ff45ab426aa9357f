//! Configuration types and utilities for Parley
//!
//! Configuration lives in a TOML file (by default `<config dir>/parley/config.toml`).
//! Every field has a default, so a partial file is valid and a missing file is
//! created with the defaults on first load.

use crate::constants::{timeouts, DEFAULT_BASE_URL, FALLBACK_MODEL};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Backend connection settings
    pub provider: ProviderConfig,
    /// Default chat settings
    pub defaults: DefaultsConfig,
}

/// Provider configuration for the language-model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL for the API, including the `/api` prefix
    pub base_url: String,
    /// Model to use when the backend reports none
    pub default_model: String,
    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: FALLBACK_MODEL.to_string(),
            timeout_seconds: Some(timeouts::DEFAULT_HTTP_TIMEOUT),
        }
    }
}

/// Default application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// System prompt injected into every request
    pub system_prompt: Option<String>,
    /// Expand thinking steps instead of showing a summary line
    pub show_thinking: bool,
    /// Default log level
    pub log_level: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            show_thinking: false,
            log_level: "info".to_string(),
        }
    }
}

impl ParleyConfig {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let config_str = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))
        } else {
            debug!("No config at {:?}, writing defaults", config_path);
            let config = ParleyConfig::default();
            config.save(config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, config_path: P) -> Result<()> {
        let config_path = config_path.as_ref();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("parley").join("config.toml"))
    }

    /// The configured system prompt, if it has any non-whitespace content
    pub fn system_prompt(&self) -> Option<&str> {
        self.defaults
            .system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParleyConfig::default();
        assert_eq!(config.provider.base_url, "http://localhost:11434/api");
        assert_eq!(config.provider.default_model, "llama2");
        assert!(!config.defaults.show_thinking);
        assert!(config.system_prompt().is_none());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ParleyConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, ParleyConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[provider]\nbase_url = \"http://gpu-box:11434/api\"\n\n[defaults]\nsystem_prompt = \"Be terse.\"\n",
        )
        .unwrap();

        let config = ParleyConfig::load(&path).unwrap();
        assert_eq!(config.provider.base_url, "http://gpu-box:11434/api");
        assert_eq!(config.provider.default_model, "llama2");
        assert_eq!(config.system_prompt(), Some("Be terse."));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[provider\nbase_url = ").unwrap();

        let err = ParleyConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_blank_system_prompt_is_ignored() {
        let mut config = ParleyConfig::default();
        config.defaults.system_prompt = Some("   \n".to_string());
        assert!(config.system_prompt().is_none());
    }
}
