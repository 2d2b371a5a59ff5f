//! Configuration management for infusite.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::MAX_RECORDS;
use crate::suggestion::DEFAULT_RECENCY_WINDOW_DAYS;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "infusite";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "history.db";

/// Longest accepted recency window, in days.
pub const MAX_RECENCY_WINDOW_DAYS: u32 = 36_500;

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "INFUSITE_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables, e.g. `INFUSITE_STORAGE__MAX_RECORDS=50`
/// 2. TOML config file at `~/.config/infusite/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Suggestion configuration.
    pub suggestion: SuggestionConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/infusite/history.db`
    pub database_path: Option<PathBuf>,
    /// Number of most recent records to keep, at most 100.
    pub max_records: usize,
}

/// Suggestion-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Days of history counted when ranking candidate sites.
    pub recency_window_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_records: MAX_RECORDS,
        }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            recency_window_days: DEFAULT_RECENCY_WINDOW_DAYS,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_records == 0 || self.storage.max_records > MAX_RECORDS {
            return Err(Error::ConfigValidation {
                message: format!(
                    "max_records must be between 1 and {MAX_RECORDS}, got {}",
                    self.storage.max_records
                ),
            });
        }

        let days = self.suggestion.recency_window_days;
        if days == 0 || days > MAX_RECENCY_WINDOW_DAYS {
            return Err(Error::ConfigValidation {
                message: format!(
                    "recency_window_days must be between 1 and {MAX_RECENCY_WINDOW_DAYS}, got {days}"
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the recency window as a duration.
    #[must_use]
    pub fn recency_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.suggestion.recency_window_days))
    }
}
