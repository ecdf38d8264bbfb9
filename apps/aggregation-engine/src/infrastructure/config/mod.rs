//! Engine Configuration
//!
//! Configuration for the demo binary, loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `AGG_SYMBOLS`: comma-separated instrument list (default: `SPY,QQQ,TLT`)
//! - `AGG_RESOLUTION`: `tick` | `second` | `minute` | `hour` | `daily`
//!   (default: `minute`)
//! - `AGG_TICK_INTERVAL_MS`: synthetic tick interval (default: 250)
//! - `AGG_REPLAY_FILE`: optional JSON-lines tick file to replay instead of
//!   generating synthetic ticks

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::subscription::Resolution;

/// Default instruments for the demo feed.
const DEFAULT_SYMBOLS: &str = "SPY,QQQ,TLT";

/// Default synthetic tick interval.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable could not be parsed.
    #[error("environment variable {key} has invalid value '{value}'")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

/// Aggregation engine demo configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Instruments to subscribe.
    pub symbols: Vec<String>,
    /// Bar resolution for the consolidated subscriptions.
    pub resolution: Resolution,
    /// Interval between synthetic ticks.
    pub tick_interval: Duration,
    /// Optional JSON-lines tick file to replay.
    pub replay_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: split_symbols(DEFAULT_SYMBOLS),
            resolution: Resolution::Minute,
            tick_interval: DEFAULT_TICK_INTERVAL,
            replay_file: None,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but empty or unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let symbols = match std::env::var("AGG_SYMBOLS") {
            Ok(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::EmptyValue("AGG_SYMBOLS".to_string()));
            }
            Ok(raw) => split_symbols(&raw),
            Err(_) => split_symbols(DEFAULT_SYMBOLS),
        };

        let resolution = parse_resolution(std::env::var("AGG_RESOLUTION").ok())?;

        let tick_interval = match std::env::var("AGG_TICK_INTERVAL_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidValue {
                    key: "AGG_TICK_INTERVAL_MS".to_string(),
                    value: raw,
                })?,
            Err(_) => DEFAULT_TICK_INTERVAL,
        };

        let replay_file = std::env::var("AGG_REPLAY_FILE").ok().map(PathBuf::from);

        Ok(Self {
            symbols,
            resolution,
            tick_interval,
            replay_file,
        })
    }
}

/// Unset resolution defaults to minute bars; a set-but-unknown name is a
/// startup error, never a silent fallback.
fn parse_resolution(raw: Option<String>) -> Result<Resolution, ConfigError> {
    match raw {
        Some(value) => {
            Resolution::from_str_case_insensitive(&value).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "AGG_RESOLUTION".to_string(),
                    value,
                }
            })
        }
        None => Ok(Resolution::default()),
    }
}

fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}
