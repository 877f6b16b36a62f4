use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::NotificationConfig;
use crate::util::redis::{RedisError, RedisServiceTrait};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Enqueue failed: {0}")]
    EnqueueFailed(String),

    #[error("Enqueue timed out after {0}s")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Well-known template identifiers consumed by the delivery worker.
pub mod templates {
    pub const QUOTE_RECEIVED: &str = "quote_received";
    pub const QUOTE_SENT: &str = "quote_sent";
    pub const QUOTE_ACCEPTED: &str = "quote_accepted";
    pub const QUOTE_DECLINED: &str = "quote_declined";
    pub const REVISION_CREATED: &str = "revision_created";
    pub const REVISION_REQUESTED: &str = "revision_requested";
}

/// One queued notification. The worker resolves the recipient from the
/// quote unless an override is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub template_id: String,
    pub quote_id: ObjectId,
    pub recipient_override: Option<String>,
    pub enqueued_at: String,
}

/// Outbound notification collaborator: the engine enqueues, an external
/// worker delivers. Delivery is fire-and-forget from the engine's point of
/// view and must never roll back the mutation that triggered it.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn enqueue(
        &self,
        template_id: &str,
        quote_id: ObjectId,
        recipient_override: Option<String>,
    ) -> Result<(), NotificationError>;
}

/// Redis list-backed outbox.
pub struct RedisNotificationQueue {
    config: NotificationConfig,
    redis: Arc<dyn RedisServiceTrait>,
}

impl RedisNotificationQueue {
    pub fn new(config: NotificationConfig, redis: Arc<dyn RedisServiceTrait>) -> Self {
        RedisNotificationQueue { config, redis }
    }
}

#[async_trait]
impl NotificationService for RedisNotificationQueue {
    #[instrument(skip(self), fields(template_id = %template_id, quote_id = %quote_id))]
    async fn enqueue(
        &self,
        template_id: &str,
        quote_id: ObjectId,
        recipient_override: Option<String>,
    ) -> Result<(), NotificationError> {
        let message = NotificationMessage {
            template_id: template_id.to_string(),
            quote_id,
            recipient_override,
            enqueued_at: chrono::Utc::now().to_rfc3339(),
        };
        let payload = serde_json::to_string(&message)
            .map_err(|e| NotificationError::SerializationError(e.to_string()))?;

        let timeout = Duration::from_secs(self.config.enqueue_timeout_secs);
        let push = self.redis.push_list(&self.config.queue_key, &payload);
        match tokio::time::timeout(timeout, push).await {
            Ok(Ok(())) => {
                info!("Notification enqueued");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Failed to enqueue notification: {}", e);
                Err(NotificationError::from(e))
            }
            Err(_) => {
                error!(
                    "Notification enqueue timed out after {}s",
                    self.config.enqueue_timeout_secs
                );
                Err(NotificationError::Timeout(self.config.enqueue_timeout_secs))
            }
        }
    }
}

impl From<RedisError> for NotificationError {
    fn from(err: RedisError) -> Self {
        NotificationError::EnqueueFailed(err.to_string())
    }
}
