//! Application configuration.
//!
//! Settings are read from a TOML file (`flashcards.toml` by default, or the path in
//! `FLASHCARDS_CONFIG`). Every field has a default, so a missing file or a partial
//! file is fine.
//!
//! ```toml
//! database_path = "db.sqlite3"
//! log_filter = "info"
//!
//! [scheduler]
//! initial_ease_factor = 2.5
//! min_ease_factor = 1.3
//! ```

use crate::error::ConfigError;
use crate::models::MIN_EASE_FACTOR;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "FLASHCARDS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "flashcards.toml";

/// Constants of the SM-2 update rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ease factor of a freshly created card
    pub initial_ease_factor: f64,
    /// Hard floor applied after every update
    pub min_ease_factor: f64,
    /// Subtracted from the ease factor on a total lapse (quality 0)
    pub lapse_penalty: f64,
    /// Delay before a lapsed card (interval 0) is due again
    pub relearn_delay_minutes: i64,
    /// Interval after the first successful recall
    pub first_interval_days: u32,
    /// Interval after the second successful recall
    pub second_interval_days: u32,
    /// Interval after a "hard" rating (quality 1 or 2)
    pub hard_interval_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_ease_factor: 2.5,
            min_ease_factor: 1.3,
            lapse_penalty: 0.2,
            relearn_delay_minutes: 5,
            first_interval_days: 1,
            second_interval_days: 6,
            hard_interval_days: 1,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // stored cards are checked against the same floor on import
        if !(self.min_ease_factor >= MIN_EASE_FACTOR) {
            return Err(ConfigError::Invalid(format!(
                "min_ease_factor must be at least {}, got {}",
                MIN_EASE_FACTOR, self.min_ease_factor
            )));
        }
        if self.initial_ease_factor < self.min_ease_factor {
            return Err(ConfigError::Invalid(format!(
                "initial_ease_factor {} is below min_ease_factor {}",
                self.initial_ease_factor, self.min_ease_factor
            )));
        }
        if self.lapse_penalty < 0.0 {
            return Err(ConfigError::Invalid("lapse_penalty must not be negative".to_string()));
        }
        if self.relearn_delay_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "relearn_delay_minutes must be positive".to_string(),
            ));
        }
        // interval 0 is reserved for the relearn sentinel
        if self.first_interval_days == 0
            || self.second_interval_days == 0
            || self.hard_interval_days == 0
        {
            return Err(ConfigError::Invalid("interval days must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Top-level settings of the desktop application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// `env_logger` filter used when `RUST_LOG` is not set
    pub log_filter: String,
    pub scheduler: SchedulerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db.sqlite3"),
            log_filter: "info".to_string(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.scheduler.validate()?;
        Ok(config)
    }

    /// Loads the file at `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads from `$FLASHCARDS_CONFIG` or `flashcards.toml` in the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }
}
