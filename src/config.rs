//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::calibration::machine::CalibrationPhase;
use crate::error::{CalibratorError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub replay: ReplayConfig,
}

/// Calibration session configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_phase_timeout_ms")]
    pub phase_timeout_ms: u64,

    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

/// Simulated hardware link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_ack_delay_ms")]
    pub ack_delay_ms: u64,

    #[serde(default)]
    pub reject_phases: Vec<CalibrationPhase>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file_logging: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

/// Session replay configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReplayConfig {
    #[serde(default = "default_replay_path")]
    pub path: String,

    #[serde(default = "default_pace")]
    pub pace: bool,
}

// Default value functions
fn default_phase_timeout_ms() -> u64 { 3000 }
fn default_event_buffer() -> usize { 64 }

fn default_ack_delay_ms() -> u64 { 20 }

fn default_log_level() -> String { "info".to_string() }
fn default_log_dir() -> String { "./logs".to_string() }

fn default_replay_path() -> String { "sessions/default_rc.jsonl".to_string() }
fn default_pace() -> bool { true }

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            phase_timeout_ms: default_phase_timeout_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ack_delay_ms: default_ack_delay_ms(),
            reject_phases: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_logging: false,
            log_dir: default_log_dir(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: default_replay_path(),
            pace: default_pace(),
        }
    }
}

impl SessionConfig {
    /// Timeout for one "set calibration phase" round trip
    #[must_use]
    pub fn phase_timeout(&self) -> Duration {
        Duration::from_millis(self.phase_timeout_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_calibrator::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.session.phase_timeout_ms == 0 || self.session.phase_timeout_ms > 60000 {
            return Err(invalid("phase_timeout_ms must be between 1 and 60000"));
        }

        if self.session.event_buffer == 0 || self.session.event_buffer > 4096 {
            return Err(invalid("event_buffer must be between 1 and 4096"));
        }

        if self.link.ack_delay_ms > 10000 {
            return Err(invalid("ack_delay_ms must be between 0 and 10000"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "log level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if self.logging.file_logging && self.logging.log_dir.is_empty() {
            return Err(invalid("log_dir cannot be empty when file_logging is enabled"));
        }

        if self.replay.path.is_empty() {
            return Err(invalid("replay path cannot be empty"));
        }

        Ok(())
    }
}

fn invalid<T: std::fmt::Display>(msg: T) -> CalibratorError {
    CalibratorError::Config(toml::de::Error::custom(msg))
}
