use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::RateLimitConfig;
use crate::util::redis::{RedisError, RedisServiceTrait};

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Too many attempts for {action}, retry in {retry_after_secs}s")]
    LimitExceeded {
        action: String,
        retry_after_secs: u64,
    },

    #[error("Rate limit backend error: {0}")]
    BackendError(String),
}

impl From<RedisError> for RateLimitError {
    fn from(err: RedisError) -> Self {
        RateLimitError::BackendError(err.to_string())
    }
}

/// Injected rate-limiting capability keyed by (identifier, action), backed
/// by TTL buckets. Passed into services rather than living as module-level
/// state.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Consumes one attempt; errs with LimitExceeded once the bucket for
    /// (identifier, action) is full.
    async fn check(&self, identifier: &str, action: &str) -> Result<(), RateLimitError>;
}

/// Redis-backed limiter: INCR the bucket counter, set the TTL on first
/// increment, reject once the counter passes max_attempts.
pub struct RedisRateLimiter {
    config: RateLimitConfig,
    redis: Arc<dyn RedisServiceTrait>,
}

impl RedisRateLimiter {
    pub fn new(config: RateLimitConfig, redis: Arc<dyn RedisServiceTrait>) -> Self {
        RedisRateLimiter { config, redis }
    }

    fn bucket_key(&self, identifier: &str, action: &str) -> String {
        format!("{}{}:{}", self.config.redis_key_prefix, action, identifier)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    #[instrument(skip(self), fields(identifier = %identifier, action = %action))]
    async fn check(&self, identifier: &str, action: &str) -> Result<(), RateLimitError> {
        let key = self.bucket_key(identifier, action);
        let count = self.redis.increment(&key).await?;
        if count == 1 {
            self.redis
                .expire(&key, self.config.window_secs)
                .await?;
        }
        if count > self.config.max_attempts as i64 {
            let ttl = self.redis.get_ttl(&key).await.unwrap_or(-1);
            let retry_after_secs = if ttl > 0 {
                ttl as u64
            } else {
                self.config.window_secs
            };
            warn!("Rate limit exceeded for {}:{}", action, identifier);
            return Err(RateLimitError::LimitExceeded {
                action: action.to_string(),
                retry_after_secs,
            });
        }
        debug!("Rate limit check passed ({}/{})", count, self.config.max_attempts);
        Ok(())
    }
}

/// In-process limiter with the same bucket semantics, for tests and local
/// runs without Redis.
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, (u32, Instant)>>,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        InMemoryRateLimiter {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, identifier: &str, action: &str) -> Result<(), RateLimitError> {
        let key = format!("{}:{}", action, identifier);
        let window = Duration::from_secs(self.config.window_secs);
        let now = Instant::now();

        let mut buckets = self.buckets.lock().await;
        let entry = buckets.entry(key).or_insert((0, now + window));
        let (count, expires_at) = entry;
        if now >= *expires_at {
            *count = 0;
            *expires_at = now + window;
        }
        *count += 1;
        if *count > self.config.max_attempts {
            let retry_after_secs = expires_at.saturating_duration_since(now).as_secs();
            return Err(RateLimitError::LimitExceeded {
                action: action.to_string(),
                retry_after_secs,
            });
        }
        Ok(())
    }
}
