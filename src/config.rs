//! Configuration surface for constructing a [`Limiter`](crate::Limiter).
//!
//! Durations cross the configuration boundary as suffixed integer fields
//! (`window_ms`, `sweep_interval_ms`). An unrecognized strategy name is a
//! construction-time error, never a silent fallback to a default strategy.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TurnstileError};

/// The window strategy families the engine knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Quota counted against clock-aligned, non-overlapping intervals
    FixedWindow,
    /// Quota enforced via an exact list of recent admission timestamps
    SlidingWindowLog,
    /// Quota approximated via two adjacent fixed windows with linear interpolation
    SlidingWindowCounter,
}

impl StrategyKind {
    /// The configuration name of this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::FixedWindow => "fixed_window",
            StrategyKind::SlidingWindowLog => "sliding_window_log",
            StrategyKind::SlidingWindowCounter => "sliding_window_counter",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = TurnstileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fixed_window" => Ok(StrategyKind::FixedWindow),
            "sliding_window_log" => Ok(StrategyKind::SlidingWindowLog),
            "sliding_window_counter" => Ok(StrategyKind::SlidingWindowCounter),
            other => Err(TurnstileError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Configuration for a [`Limiter`](crate::Limiter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Which window strategy to build
    pub strategy: StrategyKind,

    /// Maximum requests allowed per identifier within one window
    pub limit: u32,

    /// Window size in milliseconds
    pub window_ms: u64,

    /// Sweep interval for the background reclaimer, in milliseconds.
    /// Defaults to twice the window size when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep_interval_ms: Option<u64>,
}

impl LimiterConfig {
    /// Create a configuration with the default sweep interval.
    pub fn new(strategy: StrategyKind, limit: u32, window_ms: u64) -> Self {
        Self {
            strategy,
            limit,
            window_ms,
            sweep_interval_ms: None,
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading limiter configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LimiterConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(format!("failed to parse limiter config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every numeric field is positive.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(TurnstileError::InvalidLimit);
        }
        if self.window_ms == 0 {
            return Err(TurnstileError::InvalidWindow);
        }
        if self.sweep_interval_ms == Some(0) {
            return Err(TurnstileError::InvalidSweepInterval);
        }
        Ok(())
    }

    /// The window size as a duration.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// The sweep interval as a duration, defaulting to twice the window.
    pub fn sweep_interval(&self) -> Duration {
        match self.sweep_interval_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.window() * 2,
        }
    }
}
