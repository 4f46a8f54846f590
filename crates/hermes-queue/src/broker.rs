//! Broker connection.

use lapin::{Channel, Connection, ConnectionProperties};
use tracing::{info, warn};

use crate::config::QueueConfig;
use crate::error::QueueResult;

/// An open AMQP connection.
pub struct Broker {
    connection: Connection,
}

impl Broker {
    /// Connect to the broker.
    pub async fn connect(config: &QueueConfig) -> QueueResult<Self> {
        let properties =
            ConnectionProperties::default().with_connection_name("hermes-worker".into());
        let connection = Connection::connect(&config.amqp_url(), properties).await?;

        info!(
            host = %config.host,
            vhost = %config.vhost,
            "Connected to RabbitMQ"
        );

        Ok(Self { connection })
    }

    /// Open a new channel.
    pub async fn channel(&self) -> QueueResult<Channel> {
        Ok(self.connection.create_channel().await?)
    }

    /// Close the connection, logging rather than failing.
    pub async fn close(&self) {
        if let Err(e) = self.connection.close(200, "shutdown").await {
            warn!("Error closing RabbitMQ connection: {}", e);
        }
    }
}
