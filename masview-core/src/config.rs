//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/masview/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/masview/` (~/.config/masview/)
//! - State/Logs: `$XDG_STATE_HOME/masview/` (~/.local/state/masview/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Report discovery and manifest settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where run reports live and where the manifest is written
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Web root holding `output_qwen/` and `output_chatgpt/`
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Report file name inside each experiment directory
    #[serde(default = "default_report_file")]
    pub report_file: String,

    /// Prefix of the nested run directory searched when the report is not
    /// directly inside the experiment directory
    #[serde(default = "default_nested_prefix")]
    pub nested_prefix: String,

    /// Output path of the generated manifest
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            report_file: default_report_file(),
            nested_prefix: default_nested_prefix(),
            manifest_path: default_manifest_path(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_report_file() -> String {
    "mas_report.json".to_string()
}

fn default_nested_prefix() -> String {
    "output_".to_string()
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("src/data/experiments_index.json")
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of rotated log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make discovery meaningless
    pub fn validate(&self) -> Result<()> {
        if self.discovery.report_file.trim().is_empty() {
            return Err(Error::Config(
                "discovery.report_file must not be empty".to_string(),
            ));
        }
        if self.logging.max_files == 0 {
            return Err(Error::Config(
                "logging.max_files must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/masview/config.toml` (~/.config/masview/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("masview").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/masview/` (~/.local/state/masview/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("masview")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/masview/masview.log` (~/.local/state/masview/masview.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("masview.log")
    }
}
