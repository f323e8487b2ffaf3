//! Rate limiting configuration for API endpoints.
//!
//! Limits are applied per client IP with a token bucket:
//!
//! - Tokens are added at the configured rate (per second)
//! - Each request consumes one token
//! - Burst size defines the maximum tokens that can accumulate
//! - Requests are rejected with `429` when no tokens are available
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_ENABLED`: Set to `false` or `0` to disable (default: `true`)
//! - `RATE_LIMIT_PER_SECOND`: Token replenishment rate (default: 2)
//! - `RATE_LIMIT_BURST_SIZE`: Bucket size (default: 30)

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

/// Governor config keyed on the client IP.
pub type IpGovernorConfig = GovernorConfig<SmartIpKeyExtractor, ::governor::middleware::NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Whether the rate limiting layer is installed at all.
    pub enabled: bool,

    /// Requests per second, i.e. the rate at which tokens are replenished.
    pub per_second: u64,

    /// Maximum number of tokens that can accumulate.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 2,
            burst_size: 30,
        }
    }
}

impl RateLimitConfig {
    /// Reads the environment, falling back to defaults for unset or
    /// unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            per_second: std::env::var("RATE_LIMIT_PER_SECOND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.per_second),
            burst_size: std::env::var("RATE_LIMIT_BURST_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.burst_size),
        }
    }

    /// Configuration with the limiter switched off, used by tests.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Builds the governor config.
    ///
    /// The client IP is taken from `X-Forwarded-For`, `X-Real-IP` or
    /// `Forwarded` when present, and from the peer address otherwise.
    ///
    /// Returns `None` when the rate or burst size is zero.
    #[must_use]
    pub fn governor_config(&self) -> Option<IpGovernorConfig> {
        GovernorConfigBuilder::default()
            .per_second(self.per_second)
            .burst_size(self.burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
    }
}
