//! Configuration Management
//!
//! Environment-driven settings for the upstream client, the coordination
//! layer and the HTTP transport. Every value has a default, so an empty
//! environment yields a working server.

pub mod http;

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::coordination::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};
use crate::coordination::{cache::DEFAULT_MAX_ENTRIES, RateLimiter, RetryPolicy};

// Re-export
pub use http::HttpConfig;

pub const DEFAULT_SPOT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_FUTURES_BASE_URL: &str = "https://fapi.binance.com";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RATE_LIMIT_CAPACITY: f64 = 10.0;
pub const DEFAULT_RATE_LIMIT_REFILL_PER_SEC: f64 = 10.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Upstream Binance settings
///
/// ## Environment Variables
///
/// - `BINANCE_API_BASE_URL`: spot REST root (default: https://api.binance.com)
/// - `BINANCE_FUTURES_BASE_URL`: futures REST root (default: https://fapi.binance.com)
/// - `BINANCE_HTTP_TIMEOUT_SECS`: per-request timeout (default: 10)
#[derive(Debug, Clone, PartialEq)]
pub struct BinanceConfig {
    pub spot_base_url: String,
    pub futures_base_url: String,
    pub timeout: Duration,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            spot_base_url: DEFAULT_SPOT_BASE_URL.to_string(),
            futures_base_url: DEFAULT_FUTURES_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Rate limiter, retry and cache sizing
///
/// ## Environment Variables
///
/// - `RATE_LIMIT_CAPACITY` (default: 10)
/// - `RATE_LIMIT_REFILL_PER_SEC` (default: 10)
/// - `RETRY_MAX_RETRIES` (default: 3)
/// - `RETRY_BASE_DELAY_MS` (default: 300)
/// - `SEARCH_CACHE_SIZE` (default: 200)
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinationConfig {
    pub rate_limit_capacity: f64,
    pub rate_limit_refill_per_sec: f64,
    pub retry_max_retries: u32,
    pub retry_base_delay: Duration,
    pub search_cache_size: usize,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            rate_limit_capacity: DEFAULT_RATE_LIMIT_CAPACITY,
            rate_limit_refill_per_sec: DEFAULT_RATE_LIMIT_REFILL_PER_SEC,
            retry_max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_BASE_DELAY,
            search_cache_size: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CoordinationConfig {
    /// A fresh limiter with the configured bucket
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.rate_limit_capacity, self.rate_limit_refill_per_sec)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max_retries, self.retry_base_delay)
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerConfig {
    pub binance: BinanceConfig,
    pub coordination: CoordinationConfig,
    pub http: HttpConfig,
}

impl ServerConfig {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparseable or out-of-range value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: u64 =
            lookup_or(lookup, "BINANCE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let binance = BinanceConfig {
            spot_base_url: lookup("BINANCE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SPOT_BASE_URL.to_string()),
            futures_base_url: lookup("BINANCE_FUTURES_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FUTURES_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        let base_delay_ms: u64 = lookup_or(
            lookup,
            "RETRY_BASE_DELAY_MS",
            DEFAULT_BASE_DELAY.as_millis() as u64,
        )?;
        let coordination = CoordinationConfig {
            rate_limit_capacity: positive(
                "RATE_LIMIT_CAPACITY",
                lookup_or(lookup, "RATE_LIMIT_CAPACITY", DEFAULT_RATE_LIMIT_CAPACITY)?,
            )?,
            rate_limit_refill_per_sec: positive(
                "RATE_LIMIT_REFILL_PER_SEC",
                lookup_or(
                    lookup,
                    "RATE_LIMIT_REFILL_PER_SEC",
                    DEFAULT_RATE_LIMIT_REFILL_PER_SEC,
                )?,
            )?,
            retry_max_retries: lookup_or(lookup, "RETRY_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_base_delay: Duration::from_millis(base_delay_ms),
            search_cache_size: lookup_or(lookup, "SEARCH_CACHE_SIZE", DEFAULT_MAX_ENTRIES)?,
        };

        Ok(Self {
            binance,
            coordination,
            http: HttpConfig::from_lookup(lookup)?,
        })
    }
}

/// Parses `var` if present, otherwise returns `default`
pub(crate) fn lookup_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn positive(var: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be a positive number".to_string(),
        })
    }
}
