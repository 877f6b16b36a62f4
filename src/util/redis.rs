use crate::config::RedisConfig;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use async_trait::async_trait;

#[derive(Debug, Clone, Error)]
pub enum RedisError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Operation error: {0}")]
    OperationError(String),
}

/// The Redis operations the engine relies on: TTL-bucket counters for the
/// rate limiter and list pushes for the notification outbox.
#[async_trait]
pub trait RedisServiceTrait: Send + Sync {
    async fn increment(&self, key: &str) -> Result<i64, RedisError>;
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), RedisError>;
    async fn get_ttl(&self, key: &str) -> Result<i64, RedisError>;
    async fn push_list(&self, key: &str, value: &str) -> Result<(), RedisError>;
    async fn ping(&self) -> Result<(), RedisError>;
}

#[derive(Clone)]
pub struct RedisService {
    connection_manager: ConnectionManager,
}

impl RedisService {
    /// Create a new Redis service instance with connection pooling
    #[instrument(skip(config), fields(host = %config.host, port = config.port, db = config.database))]
    pub async fn new(config: RedisConfig) -> Result<Self, RedisError> {
        info!("Initializing Redis service");

        config.validate().map_err(|e| {
            error!("Redis configuration validation failed: {}", e);
            RedisError::ConfigError(e.to_string())
        })?;

        let client = Client::open(config.get_connection_url()).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            RedisError::ConnectionError(format!("Client creation failed: {}", e))
        })?;

        let connection_manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to create Redis connection manager: {}", e);
            RedisError::ConnectionError(format!("Connection manager creation failed: {}", e))
        })?;

        let service = Self { connection_manager };

        // Fail fast on an unreachable server
        RedisServiceTrait::ping(&service).await?;

        info!("Redis service initialized successfully");
        Ok(service)
    }

    fn conn(&self) -> ConnectionManager {
        self.connection_manager.clone()
    }
}

#[async_trait]
impl RedisServiceTrait for RedisService {
    #[instrument(skip(self), fields(key = %key))]
    async fn increment(&self, key: &str) -> Result<i64, RedisError> {
        debug!("Incrementing key: {}", key);
        let mut conn = self.conn();
        conn.incr(key, 1).await.map_err(|e| {
            error!("Failed to increment key '{}': {}", key, e);
            RedisError::OperationError(format!("INCR failed: {}", e))
        })
    }

    #[instrument(skip(self), fields(key = %key, ttl_secs))]
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), RedisError> {
        let mut conn = self.conn();
        conn.expire::<_, ()>(key, ttl_secs as i64).await.map_err(|e| {
            error!("Failed to set expiry on key '{}': {}", key, e);
            RedisError::OperationError(format!("EXPIRE failed: {}", e))
        })
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn get_ttl(&self, key: &str) -> Result<i64, RedisError> {
        let mut conn = self.conn();
        conn.ttl(key).await.map_err(|e| {
            error!("Failed to read TTL for key '{}': {}", key, e);
            RedisError::OperationError(format!("TTL failed: {}", e))
        })
    }

    #[instrument(skip(self, value), fields(key = %key))]
    async fn push_list(&self, key: &str, value: &str) -> Result<(), RedisError> {
        let mut conn = self.conn();
        conn.lpush::<_, _, ()>(key, value).await.map_err(|e| {
            error!("Failed to push to list '{}': {}", key, e);
            RedisError::OperationError(format!("LPUSH failed: {}", e))
        })
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), RedisError> {
        debug!("Pinging Redis server");
        let mut conn = self.conn();
        let result: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis ping failed: {}", e);
                RedisError::OperationError(format!("Ping failed: {}", e))
            })?;
        if result == "PONG" {
            Ok(())
        } else {
            error!("Unexpected ping response: {}", result);
            Err(RedisError::OperationError(format!(
                "Unexpected ping response: {}",
                result
            )))
        }
    }
}
