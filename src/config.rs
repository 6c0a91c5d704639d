//! Game configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use hasami_core::{DEFAULT_INITIAL_SECONDS, ResignPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Tunables shared by every room session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// Clock allotment per side for rooms without their own override.
    #[serde(default = "default_initial_seconds")]
    initial_seconds: u32,

    /// Seconds a finished room stays visible before it is removed.
    #[serde(default = "default_cleanup_grace_secs")]
    cleanup_grace_secs: u64,

    /// Interval between derived clock readings while playing.
    #[serde(default = "default_clock_tick_millis")]
    clock_tick_millis: u64,

    /// Who may resign.
    #[serde(default)]
    resign_policy: ResignPolicy,
}

#[instrument]
fn default_initial_seconds() -> u32 {
    DEFAULT_INITIAL_SECONDS
}

#[instrument]
fn default_cleanup_grace_secs() -> u64 {
    10
}

#[instrument]
fn default_clock_tick_millis() -> u64 {
    100
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_seconds: default_initial_seconds(),
            cleanup_grace_secs: default_cleanup_grace_secs(),
            clock_tick_millis: default_clock_tick_millis(),
            resign_policy: ResignPolicy::default(),
        }
    }
}

impl GameConfig {
    /// Creates a configuration with explicit values.
    #[instrument]
    pub fn new(
        initial_seconds: u32,
        cleanup_grace_secs: u64,
        clock_tick_millis: u64,
        resign_policy: ResignPolicy,
    ) -> Self {
        Self {
            initial_seconds,
            cleanup_grace_secs,
            clock_tick_millis,
            resign_policy,
        }
    }

    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(initial_seconds = config.initial_seconds, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.clock_tick_millis == 0 {
            return Err(ConfigError::new("clock_tick_millis must be positive"));
        }
        Ok(config)
    }

    /// Grace period before a finished room is removed.
    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_secs(self.cleanup_grace_secs)
    }

    /// Interval between clock readings.
    pub fn clock_tick(&self) -> Duration {
        Duration::from_millis(self.clock_tick_millis)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
