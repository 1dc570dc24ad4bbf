//! Configuration management with YAML support

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::DEFAULT_BATCH_SIZE;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Call history paging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Rows fetched per page by forward-only cursors.
    #[serde(default = "default_cursor_batch_size")]
    pub cursor_batch_size: usize,

    /// Cap for listing a whole conversation when the caller gives none.
    #[serde(default)]
    pub fetch_all_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/callhistory/calls.db".to_string()
}

fn default_cursor_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            cursor_batch_size: default_cursor_batch_size(),
            fetch_all_limit: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./callhistory.yaml (current directory)
    /// 3. ~/.config/callhistory/callhistory.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "callhistory.yaml".to_string(),
            shellexpand::tilde("~/.config/callhistory/callhistory.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)
                    .with_context(|| format!("reading {}", search_path))?;
                let config: Config = serde_yaml::from_str(&content)
                    .with_context(|| format!("parsing {}", search_path))?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.database.path).to_string();
        PathBuf::from(expanded)
    }
}
