use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: u8,
    pub connection_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub use_tls: bool,
}

impl RedisConfig {
    /// Load Redis configuration from environment variables
    ///
    /// Expected environment variables:
    /// - REDIS_HOST: Redis server host (required)
    /// - REDIS_PORT: Redis server port (defaults to 6379)
    /// - REDIS_USERNAME / REDIS_PASSWORD: optional credentials
    /// - REDIS_DATABASE: database number (defaults to 0)
    /// - REDIS_CONNECTION_TIMEOUT: connection timeout in seconds (defaults to 5)
    /// - REDIS_COMMAND_TIMEOUT: command timeout in seconds (defaults to 10)
    /// - REDIS_USE_TLS: whether to use TLS (defaults to false)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading Redis configuration from environment variables");

        let host = env::var("REDIS_HOST").map_err(|_| {
            error!("REDIS_HOST environment variable not found");
            ConfigError::EnvVarNotFound("REDIS_HOST".to_string())
        })?;
        debug!("Redis host: {}", host);

        let port = env::var("REDIS_PORT")
            .unwrap_or_else(|_| {
                warn!("REDIS_PORT not set, using default: 6379");
                "6379".to_string()
            })
            .parse()
            .map_err(|e| {
                error!("Invalid REDIS_PORT value: {}", e);
                ConfigError::ParseError(format!("Invalid port: {}", e))
            })?;

        let username = env::var("REDIS_USERNAME").ok();
        let password = env::var("REDIS_PASSWORD").ok();

        let database = env::var("REDIS_DATABASE")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|e| {
                error!("Invalid REDIS_DATABASE value: {}", e);
                ConfigError::ParseError(format!("Invalid database: {}", e))
            })?;

        let connection_timeout_secs = env::var("REDIS_CONNECTION_TIMEOUT")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|e| {
                error!("Invalid REDIS_CONNECTION_TIMEOUT value: {}", e);
                ConfigError::ParseError(format!("Invalid connection timeout: {}", e))
            })?;

        let command_timeout_secs = env::var("REDIS_COMMAND_TIMEOUT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|e| {
                error!("Invalid REDIS_COMMAND_TIMEOUT value: {}", e);
                ConfigError::ParseError(format!("Invalid command timeout: {}", e))
            })?;

        let use_tls = env::var("REDIS_USE_TLS")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let config = Self {
            host,
            port,
            username,
            password,
            database,
            connection_timeout_secs,
            command_timeout_secs,
            use_tls,
        };
        config.validate()?;
        info!("Redis configuration loaded successfully");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "Redis host must not be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "Redis port must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection URL in the form redis[s]://[user:pass@]host:port/db
    pub fn get_connection_url(&self) -> String {
        let scheme = if self.use_tls { "rediss" } else { "redis" };
        let auth = match (&self.username, &self.password) {
            (Some(user), Some(pass)) => format!("{}:{}@", user, pass),
            (None, Some(pass)) => format!(":{}@", pass),
            _ => String::new(),
        };
        format!(
            "{}://{}{}:{}/{}",
            scheme, auth, self.host, self.port, self.database
        )
    }
}
