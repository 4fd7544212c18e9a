//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{OiError, Result};

/// Highest number of joystick ports the FRC driver station exposes.
pub const MAX_JOYSTICK_PORTS: usize = 6;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub joysticks: JoystickConfig,
    #[serde(default)]
    pub control_loop: ControlLoopConfig,
}

/// Joystick configuration
#[derive(Debug, Deserialize, Clone)]
pub struct JoystickConfig {
    #[serde(default = "default_count")]
    pub count: usize,

    #[serde(default = "default_deadzone")]
    pub deadzone: f64,

    /// Explicit `/dev/input/eventN` paths, one per port. Empty means auto-detect.
    #[serde(default)]
    pub devices: Vec<String>,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlLoopConfig {
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    #[serde(default = "default_log_interval_loops")]
    pub log_interval_loops: u64,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            deadzone: default_deadzone(),
            devices: Vec::new(),
        }
    }
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            log_interval_loops: default_log_interval_loops(),
        }
    }
}

// Default value functions
fn default_count() -> usize { 2 }
fn default_deadzone() -> f64 { 0.01 }

fn default_period_ms() -> u64 { 20 }
fn default_log_interval_loops() -> u64 { 50 }

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
    /// use frc_oi::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string.
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
    pub fn validate(&self) -> Result<()> {
        if self.joysticks.count == 0 || self.joysticks.count > MAX_JOYSTICK_PORTS {
            return Err(invalid(format!(
                "joystick count must be between 1 and {}",
                MAX_JOYSTICK_PORTS
            )));
        }

        if !(0.0..=0.25).contains(&self.joysticks.deadzone) {
            return Err(invalid("deadzone must be between 0.0 and 0.25"));
        }

        if self.joysticks.devices.len() > self.joysticks.count {
            return Err(invalid("more device paths listed than joystick ports"));
        }

        if self.joysticks.devices.iter().any(|path| path.is_empty()) {
            return Err(invalid("device paths cannot be empty"));
        }

        for (index, path) in self.joysticks.devices.iter().enumerate() {
            if self.joysticks.devices[..index].contains(path) {
                return Err(invalid(format!("device path {} is listed more than once", path)));
            }
        }

        if self.control_loop.period_ms == 0 || self.control_loop.period_ms > 1000 {
            return Err(invalid("period_ms must be between 1 and 1000"));
        }

        if self.control_loop.log_interval_loops == 0 {
            return Err(invalid("log_interval_loops must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> OiError {
    OiError::Config(toml::de::Error::custom(msg))
}
