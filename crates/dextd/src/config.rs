//! Configuration management for dextd.
//!
//! Loads settings from /etc/dextd/config.toml or uses defaults.

use anyhow::{Context, Result};
use dext_shared::{CONFIG_PATH, DEFAULT_CONFIG_PATH, DEFAULT_DEXT_IDENTIFIER, DEFAULT_HISTORY_LIMIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::policy::ReplacementPolicy;

/// Which extension this process manages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default = "default_identifier")]
    pub identifier: String,
}

fn default_identifier() -> String {
    DEFAULT_DEXT_IDENTIFIER.to_string()
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
        }
    }
}

/// Activation controller behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Answer to "replace the installed extension?"
    #[serde(default)]
    pub replacement_policy: ReplacementPolicy,

    /// Fail an attempt still pending after this long. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_timeout_ms: Option<u64>,

    /// Transition records kept in memory
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl ControllerConfig {
    pub fn activation_timeout(&self) -> Option<Duration> {
        self.activation_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            replacement_policy: ReplacementPolicy::default(),
            activation_timeout_ms: None,
            history_limit: default_history_limit(),
        }
    }
}

/// Logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extension: ExtensionConfig,

    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Where a loaded config came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No usable file; carries the reason
    Defaults(String),
}

impl ConfigSource {
    /// Report the outcome. Call once a subscriber is installed.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults(reason) => {
                warn!("Config not loaded, using defaults: {}", reason)
            }
        }
    }
}

impl Config {
    /// Load config from `path` if given, else the standard locations, else defaults
    pub fn load(path: Option<&Path>) -> Self {
        let (config, source) = Self::load_with_source(path);
        source.log();
        config
    }

    /// Same lookup as `load` without logging, so the caller can report the
    /// source after logging is set up
    pub fn load_with_source(path: Option<&Path>) -> (Self, ConfigSource) {
        let candidates = match path {
            Some(path) => vec![path.to_path_buf()],
            None => vec![PathBuf::from(CONFIG_PATH), PathBuf::from(DEFAULT_CONFIG_PATH)],
        };

        let mut reason = String::new();
        for candidate in candidates {
            match Self::load_from_path(&candidate) {
                Ok(config) => return (config, ConfigSource::File(candidate)),
                Err(e) => reason = format!("{:#}", e),
            }
        }
        (Config::default(), ConfigSource::Defaults(reason))
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Write the default config to `path`
    pub fn save_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }
}
