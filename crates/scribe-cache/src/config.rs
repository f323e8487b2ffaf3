//! Cache configuration.
//!
//! Connection and reconnect settings for the cache backend, loaded from
//! environment variables.

use std::env;
use std::time::Duration;

/// Which backend [`crate::Cache::connect`] builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// Remote Redis server through a reconnecting connection manager.
    Redis,
    /// In-process store. Not shared between processes.
    Memory,
}

impl CacheBackendKind {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Self::Memory,
            _ => Self::Redis,
        }
    }
}

/// Cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `CACHE_ENABLED`: Set to `false` or `0` to run without a cache (default: `true`)
/// - `CACHE_BACKEND`: `redis` or `memory` (default: `redis`)
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_RETRY_FACTOR_MS`: Base reconnect delay in milliseconds (default: `200`)
/// - `CACHE_RETRY_MAX_DELAY_MS`: Cap on the reconnect delay in milliseconds (default: `2000`)
/// - `CACHE_RETRY_ATTEMPTS`: Reconnect attempts per failure (default: `6`)
/// - `CACHE_CONNECT_TIMEOUT_SECS`: Connection timeout (default: `5`)
/// - `CACHE_RESPONSE_TIMEOUT_SECS`: Per-command response timeout (default: `2`)
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Whether the service should use a cache at all.
    pub enabled: bool,

    /// Backend implementation.
    pub backend: CacheBackendKind,

    /// Redis connection URL.
    pub redis_url: String,

    /// Multiplier applied to the exponential reconnect delay, in milliseconds.
    pub retry_factor_ms: u64,

    /// Upper bound for a single reconnect delay, in milliseconds.
    pub retry_max_delay_ms: u64,

    /// Number of reconnect attempts before an operation reports failure.
    pub retry_attempts: usize,

    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,

    /// Timeout for a single command round-trip.
    pub response_timeout: Duration,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: env::var("CACHE_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            backend: env::var("CACHE_BACKEND")
                .map(|v| CacheBackendKind::parse(&v))
                .unwrap_or(defaults.backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            retry_factor_ms: parse_env("CACHE_RETRY_FACTOR_MS").unwrap_or(defaults.retry_factor_ms),
            retry_max_delay_ms: parse_env("CACHE_RETRY_MAX_DELAY_MS")
                .unwrap_or(defaults.retry_max_delay_ms),
            retry_attempts: parse_env("CACHE_RETRY_ATTEMPTS").unwrap_or(defaults.retry_attempts),
            connect_timeout: parse_env("CACHE_CONNECT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            response_timeout: parse_env("CACHE_RESPONSE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.response_timeout),
        }
    }

    /// In-memory configuration, handy for tests and local development.
    pub fn memory() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::Redis,
            redis_url: "redis://127.0.0.1:6379".into(),
            retry_factor_ms: 200,
            retry_max_delay_ms: 2000,
            retry_attempts: 6,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(2),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, CacheBackendKind::Redis);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.retry_factor_ms, 200);
        assert_eq!(config.retry_max_delay_ms, 2000);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(CacheBackendKind::parse("memory"), CacheBackendKind::Memory);
        assert_eq!(CacheBackendKind::parse(" In-Memory "), CacheBackendKind::Memory);
        assert_eq!(CacheBackendKind::parse("redis"), CacheBackendKind::Redis);
        assert_eq!(CacheBackendKind::parse("anything-else"), CacheBackendKind::Redis);
    }

    #[test]
    fn test_memory_config() {
        let config = CacheConfig::memory();
        assert_eq!(config.backend, CacheBackendKind::Memory);
        assert!(config.enabled);
    }
}
