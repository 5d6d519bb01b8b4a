//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Throttles login attempts per peer IP using tower_governor.
//! Uses the Generic Cell Rate Algorithm (GCRA) for efficient,
//! accurate rate enforcement without background processes.

use governor::middleware::StateInformationMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Type alias for the governor config with default settings
/// StateInformationMiddleware is used when use_headers() is called to add X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether the login route is throttled at all
    pub enabled: bool,
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl RateLimitConfig {
    /// Strict config for credential endpoints
    pub fn strict() -> Self {
        Self {
            enabled: true,
            per_second: 4,  // One request every 4 seconds
            burst_size: 2,
        }
    }

    /// Create a lenient config for public endpoints
    pub fn lenient() -> Self {
        Self {
            enabled: true,
            per_second: 1,  // Replenish 1 per second
            burst_size: 10,
        }
    }
}

/// Create a rate limiting governor config
///
/// Returns `None` when the limiter is disabled or the config is rejected
/// (zero period or burst). Uses PeerIpKeyExtractor, so the service must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// Adds X-RateLimit-* headers to responses for quota visibility.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<DefaultGovernorConfig>> {
    if !config.enabled {
        return None;
    }

    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()  // Adds X-RateLimit-After, X-RateLimit-Limit, X-RateLimit-Remaining
        .finish()
        .map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.per_second, 4);
        assert_eq!(config.burst_size, 2);
    }

    #[test]
    fn test_lenient_config() {
        let config = RateLimitConfig::lenient();
        assert_eq!(config.per_second, 1);
        assert_eq!(config.burst_size, 10);
    }

    #[test]
    fn test_create_governor_config() {
        let governor = create_governor_config(&RateLimitConfig::default()).unwrap();
        assert!(Arc::strong_count(&governor) > 0);
    }

    #[test]
    fn test_disabled_or_invalid() {
        let disabled = RateLimitConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(create_governor_config(&disabled).is_none());

        let zero_burst = RateLimitConfig {
            burst_size: 0,
            ..Default::default()
        };
        assert!(create_governor_config(&zero_burst).is_none());
    }
}
