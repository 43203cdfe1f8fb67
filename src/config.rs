//! View configuration parsed from environment variables.

use std::str::FromStr;

use canvas::consts::{DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE};
use canvas::zoom::ScaleExtent;

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8181/onos/ui/websock/core";
pub const DEFAULT_MAP: &str = "*continental_us";
pub const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: cannot parse '{value}'")]
    Parse { var: &'static str, value: String },
    #[error("server url must start with ws:// or wss://, got '{0}'")]
    InvalidUrl(String),
    #[error("zoom bounds must satisfy 0 < min <= max, got min={min} max={max}")]
    InvalidZoom { min: String, max: String },
    #[error("reconnect delays must satisfy 0 < initial <= max, got initial={initial}ms max={max}ms")]
    InvalidBackoff { initial: u64, max: u64 },
}

/// Reconnect backoff bounds, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self { initial_ms: DEFAULT_RECONNECT_INITIAL_MS, max_ms: DEFAULT_RECONNECT_MAX_MS }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub server_url: String,
    pub map: String,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub reconnect: BackoffConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            map: DEFAULT_MAP.to_owned(),
            zoom_min: DEFAULT_MIN_SCALE,
            zoom_max: DEFAULT_MAX_SCALE,
            reconnect: BackoffConfig::default(),
        }
    }
}

impl ViewConfig {
    /// Build typed view config from environment variables.
    ///
    /// Optional:
    /// - `TOPO_SERVER_URL`: websocket endpoint (default [`DEFAULT_SERVER_URL`])
    /// - `TOPO_MAP`: background map id (default `*continental_us`)
    /// - `TOPO_ZOOM_MIN` / `TOPO_ZOOM_MAX`: scale bounds (default 0.25 / 10)
    /// - `TOPO_RECONNECT_INITIAL_MS` / `TOPO_RECONNECT_MAX_MS`: default 1000 / 10000
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or inconsistent values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ViewConfig::from_env`], reading through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or inconsistent values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            server_url: lookup("TOPO_SERVER_URL").unwrap_or(defaults.server_url),
            map: lookup("TOPO_MAP").unwrap_or(defaults.map),
            zoom_min: parse_var(&lookup, "TOPO_ZOOM_MIN", defaults.zoom_min)?,
            zoom_max: parse_var(&lookup, "TOPO_ZOOM_MAX", defaults.zoom_max)?,
            reconnect: BackoffConfig {
                initial_ms: parse_var(&lookup, "TOPO_RECONNECT_INITIAL_MS", defaults.reconnect.initial_ms)?,
                max_ms: parse_var(&lookup, "TOPO_RECONNECT_MAX_MS", defaults.reconnect.max_ms)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        let zoom_ok = self.zoom_min.is_finite()
            && self.zoom_max.is_finite()
            && self.zoom_min > 0.0
            && self.zoom_min <= self.zoom_max;
        if !zoom_ok {
            return Err(ConfigError::InvalidZoom { min: self.zoom_min.to_string(), max: self.zoom_max.to_string() });
        }
        let BackoffConfig { initial_ms, max_ms } = self.reconnect;
        if initial_ms == 0 || initial_ms > max_ms {
            return Err(ConfigError::InvalidBackoff { initial: initial_ms, max: max_ms });
        }
        Ok(())
    }

    #[must_use]
    pub fn scale_extent(&self) -> ScaleExtent {
        ScaleExtent::new(self.zoom_min, self.zoom_max)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Parse { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
