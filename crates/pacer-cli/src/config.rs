// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Demo settings from environment variables and command-line flags.
//!
//! Flags win over the environment. Unknown flags are rejected.

use std::time::Duration;

use thiserror::Error;

pub const ENV_TICK_MS: &str = "PACER_TICK_MS";
pub const ENV_TIME_SCALE: &str = "PACER_TIME_SCALE";
pub const ENV_SIMULATE: &str = "PACER_SIMULATE";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown flag `{0}`")]
    UnknownFlag(String),
    #[error("flag `{0}` expects a value")]
    MissingValue(String),
    #[error("invalid value `{value}` for {source_name}: {reason}")]
    InvalidValue {
        source_name: String,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    /// How long the driver sleeps between pumps.
    pub tick_interval: Duration,
    /// Multiplier applied to each measured delta before it reaches the scheduler.
    pub time_scale: f64,
    /// Advance a synthetic clock by `tick_interval` per pump instead of sleeping.
    pub simulate: bool,
    pub json: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            tick_interval: Duration::from_millis(1),
            time_scale: 1.0,
            simulate: false,
            json: false,
        }
    }
}

impl DemoConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = DemoConfig::default();
        if let Some(v) = lookup(ENV_TICK_MS) {
            config.tick_interval = parse_tick_ms(ENV_TICK_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_TIME_SCALE) {
            config.time_scale = parse_scale(ENV_TIME_SCALE, &v)?;
        }
        if let Some(v) = lookup(ENV_SIMULATE) {
            config.simulate = parse_flag(ENV_SIMULATE, &v)?;
        }
        Ok(config)
    }

    /// Apply `demo` subcommand flags on top of the current settings.
    pub fn apply_args(&mut self, args: &[String]) -> Result<(), ConfigError> {
        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            match flag.as_str() {
                "--simulate" => self.simulate = true,
                "--json" => self.json = true,
                "--tick-ms" => {
                    let value = iter.next().ok_or_else(|| ConfigError::MissingValue(flag.clone()))?;
                    self.tick_interval = parse_tick_ms(flag, value)?;
                }
                "--scale" => {
                    let value = iter.next().ok_or_else(|| ConfigError::MissingValue(flag.clone()))?;
                    self.time_scale = parse_scale(flag, value)?;
                }
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            }
        }
        Ok(())
    }
}

fn invalid(source_name: &str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        source_name: source_name.to_string(),
        value: value.to_string(),
        reason,
    }
}

fn parse_tick_ms(source_name: &str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(invalid(source_name, value, "must be at least 1")),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(_) => Err(invalid(source_name, value, "expected whole milliseconds")),
    }
}

fn parse_scale(source_name: &str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(x) if x.is_finite() && x > 0.0 => Ok(x),
        Ok(_) => Err(invalid(source_name, value, "must be a positive number")),
        Err(_) => Err(invalid(source_name, value, "expected a number")),
    }
}

fn parse_flag(source_name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(source_name, value, "expected 1/0 or true/false")),
    }
}
