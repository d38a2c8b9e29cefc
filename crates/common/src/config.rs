use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8000/api/v1/";
pub const DEFAULT_PROXY_PREFIX: &str = "/api/python/";
pub const DEFAULT_SIGNALS_PATH: &str = "/api/python/signals/dashboard";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_CAPACITY: usize = 20;
pub const DEFAULT_SIGNAL_CAPACITY: usize = 50;
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Where requests under `proxy_prefix` are forwarded.
    pub upstream_url: String,
    pub proxy_prefix: String,
    pub signals_path: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub log_capacity: usize,
    pub signal_capacity: usize,
    /// Log files go here while the terminal view owns stdout.
    pub log_dir: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            proxy_prefix: DEFAULT_PROXY_PREFIX.to_string(),
            signals_path: DEFAULT_SIGNALS_PATH.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_capacity: DEFAULT_LOG_CAPACITY,
            signal_capacity: DEFAULT_SIGNAL_CAPACITY,
            log_dir: DEFAULT_LOG_DIR.to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let poll_ms = non_zero(
            "DASHBOARD_POLL_INTERVAL_MS",
            parse_or(&lookup, "DASHBOARD_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
        )?;
        // reqwest would fail every request on a zero timeout
        let timeout_secs = non_zero(
            "DASHBOARD_REQUEST_TIMEOUT_SECS",
            parse_or(&lookup, "DASHBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
        )?;

        Ok(Self {
            upstream_url: lookup("DASHBOARD_UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            proxy_prefix: lookup("DASHBOARD_PROXY_PREFIX").unwrap_or(defaults.proxy_prefix),
            signals_path: lookup("DASHBOARD_SIGNALS_PATH").unwrap_or(defaults.signals_path),
            poll_interval: Duration::from_millis(poll_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            log_capacity: parse_or(&lookup, "DASHBOARD_LOG_CAPACITY", DEFAULT_LOG_CAPACITY)?
                .max(1),
            signal_capacity: parse_or(&lookup, "DASHBOARD_SIGNAL_CAPACITY", DEFAULT_SIGNAL_CAPACITY)?
                .max(1),
            log_dir: lookup("DASHBOARD_LOG_DIR").unwrap_or(defaults.log_dir),
        })
    }
}

fn non_zero(key: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}
