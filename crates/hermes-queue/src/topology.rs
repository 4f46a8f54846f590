//! Exchange and queue declaration, QoS and consumption.
//!
//! Declarations are idempotent, so every worker declares the full topology
//! on startup rather than relying on an external provisioning step.

use lapin::options::{
    BasicConsumeOptions, BasicQosOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{Channel, Consumer, ExchangeKind};
use tracing::info;

use crate::config::QueueConfig;
use crate::error::QueueResult;

/// Arguments for a durable queue declaration.
pub fn queue_arguments(config: &QueueConfig) -> FieldTable {
    let mut args = FieldTable::default();
    if config.quorum {
        args.insert(
            "x-queue-type".into(),
            AMQPValue::LongString("quorum".into()),
        );
        args.insert(
            "x-max-in-memory-length".into(),
            AMQPValue::LongInt(config.max_in_memory_length),
        );
    }
    args
}

/// Declare the topic exchange, both queues and their bindings.
pub async fn declare_topology(channel: &Channel, config: &QueueConfig) -> QueueResult<()> {
    channel
        .exchange_declare(
            &config.exchange,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    let bindings = [
        (&config.task_queue, &config.task_routing_key),
        (&config.completion_queue, &config.completion_routing_key),
    ];

    for (queue, routing_key) in bindings {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                queue_arguments(config),
            )
            .await?;

        channel
            .queue_bind(
                queue,
                &config.exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(
            exchange = %config.exchange,
            queue = %queue,
            routing_key = %routing_key,
            "Declared queue binding"
        );
    }

    Ok(())
}

/// Set prefetch and start a manual-ack consumer on the task queue.
///
/// The prefetch count bounds how many deliveries are in flight at once.
pub async fn start_consumer(
    channel: &Channel,
    config: &QueueConfig,
    consumer_tag: &str,
) -> QueueResult<Consumer> {
    channel
        .basic_qos(config.prefetch, BasicQosOptions::default())
        .await?;

    let consumer = channel
        .basic_consume(
            &config.task_queue,
            consumer_tag,
            BasicConsumeOptions {
                no_ack: false,
                ..BasicConsumeOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    info!(
        queue = %config.task_queue,
        prefetch = config.prefetch,
        consumer_tag,
        "Consuming tasks"
    );

    Ok(consumer)
}
