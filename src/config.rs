//! Configuration Module
//!
//! Handles loading cache settings from environment variables.

use std::env;
use std::time::Duration;

/// Default TTL applied when `set` is called with a zero TTL (5 minutes).
pub const DEFAULT_TTL_MS: u64 = 300_000;

/// Default interval between background sweeps (1 second).
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Cache construction parameters.
///
/// A zero `default_ttl` makes entries set without a TTL live forever.
/// A zero `sweep_interval` disables the background sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Fallback lifetime for entries written with a zero TTL
    pub default_ttl: Duration,
    /// Cadence of the background sweeper
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a config from explicit durations.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            default_ttl,
            sweep_interval,
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        Self {
            default_ttl: Duration::from_millis(env_millis(
                "CACHE_DEFAULT_TTL_MS",
                DEFAULT_TTL_MS,
            )),
            sweep_interval: Duration::from_millis(env_millis(
                "CACHE_SWEEP_INTERVAL_MS",
                DEFAULT_SWEEP_INTERVAL_MS,
            )),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
        }
    }
}

fn env_millis(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
