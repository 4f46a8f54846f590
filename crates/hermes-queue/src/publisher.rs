//! Completion publishing.

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions};
use lapin::{BasicProperties, Channel};
use tracing::debug;

use hermes_models::TaskCompletion;

use crate::error::{QueueError, QueueResult};

/// Persistent delivery mode.
const PERSISTENT: u8 = 2;

/// Emits task completions for downstream consumers.
#[async_trait]
pub trait CompletionPublisher: Send + Sync {
    async fn publish(&self, completion: &TaskCompletion) -> QueueResult<()>;
}

/// Publishes completions to the topic exchange with publisher confirms.
pub struct AmqpPublisher {
    channel: Channel,
    exchange: String,
}

impl AmqpPublisher {
    /// Wrap a channel dedicated to publishing and enable confirms on it.
    pub async fn new(channel: Channel, exchange: impl Into<String>) -> QueueResult<Self> {
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        Ok(Self {
            channel,
            exchange: exchange.into(),
        })
    }
}

#[async_trait]
impl CompletionPublisher for AmqpPublisher {
    async fn publish(&self, completion: &TaskCompletion) -> QueueResult<()> {
        let payload = serde_json::to_vec(completion)?;
        let routing_key = completion.routing_key();

        debug!("Publishing completion to {}", routing_key);

        let confirmation = self
            .channel
            .basic_publish(
                &self.exchange,
                &routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(PERSISTENT),
            )
            .await?
            .await?;

        if confirmation.is_nack() {
            return Err(QueueError::PublishNacked(routing_key));
        }

        Ok(())
    }
}
