use serde::{Deserialize, Serialize};
use std::env;
use tracing::{error, info, warn};

use crate::config::ConfigError;

/// Configuration for the (identifier, action) rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Attempts allowed per bucket before requests are rejected.
    pub max_attempts: u32,
    /// Bucket TTL in seconds; counters reset when it expires.
    pub window_secs: u64,
    /// Redis key prefix for rate-limit buckets.
    pub redis_key_prefix: String,
}

impl RateLimitConfig {
    /// Create RateLimitConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading rate limit configuration from environment variables");

        let max_attempts = env::var("RATE_LIMIT_MAX_ATTEMPTS")
            .unwrap_or_else(|_| {
                warn!("RATE_LIMIT_MAX_ATTEMPTS not set, defaulting to 5");
                "5".to_string()
            })
            .parse::<u32>()
            .map_err(|_| {
                error!("Invalid RATE_LIMIT_MAX_ATTEMPTS value");
                ConfigError::InvalidValue("Invalid RATE_LIMIT_MAX_ATTEMPTS value".to_string())
            })?;

        let window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| {
                warn!("RATE_LIMIT_WINDOW_SECS not set, defaulting to 3600 seconds");
                "3600".to_string()
            })
            .parse::<u64>()
            .map_err(|_| {
                error!("Invalid RATE_LIMIT_WINDOW_SECS value");
                ConfigError::InvalidValue("Invalid RATE_LIMIT_WINDOW_SECS value".to_string())
            })?;

        let redis_key_prefix = env::var("RATE_LIMIT_REDIS_PREFIX")
            .unwrap_or_else(|_| "rate_limit:".to_string());

        let config = RateLimitConfig {
            max_attempts,
            window_secs,
            redis_key_prefix,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "max_attempts must be greater than zero".to_string(),
            ));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "window_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            max_attempts: 5,
            window_secs: 3600,
            redis_key_prefix: "rate_limit:".to_string(),
        }
    }
}
