use serde::{Deserialize, Serialize};
use std::env;
use tracing::{error, info, warn};

use crate::config::ConfigError;

/// Configuration for the outbound notification queue. Delivery itself is
/// handled by an external worker; the engine only enqueues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Redis list the delivery worker consumes from.
    pub queue_key: String,
    /// Upper bound on a single enqueue call, in seconds.
    pub enqueue_timeout_secs: u64,
}

impl NotificationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading notification configuration from environment variables");

        let queue_key = env::var("NOTIFICATION_QUEUE_KEY")
            .unwrap_or_else(|_| "notifications:outbox".to_string());

        let enqueue_timeout_secs = env::var("NOTIFICATION_ENQUEUE_TIMEOUT")
            .unwrap_or_else(|_| {
                warn!("NOTIFICATION_ENQUEUE_TIMEOUT not set, defaulting to 3 seconds");
                "3".to_string()
            })
            .parse::<u64>()
            .map_err(|_| {
                error!("Invalid NOTIFICATION_ENQUEUE_TIMEOUT value");
                ConfigError::InvalidValue(
                    "Invalid NOTIFICATION_ENQUEUE_TIMEOUT value".to_string(),
                )
            })?;

        let config = NotificationConfig {
            queue_key,
            enqueue_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "Notification queue key must not be empty".to_string(),
            ));
        }
        if self.enqueue_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Enqueue timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            queue_key: "notifications:outbox".to_string(),
            enqueue_timeout_secs: 3,
        }
    }
}
