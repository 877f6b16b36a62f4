pub mod app_conf;
pub mod mongo_conf;
pub mod notification_conf;
pub mod rate_limit_conf;
pub mod redis_conf;

pub use mongo_conf::MongoConfig;
pub use notification_conf::NotificationConfig;
pub use rate_limit_conf::RateLimitConfig;
pub use redis_conf::RedisConfig;

/// Common configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
