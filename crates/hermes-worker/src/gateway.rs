//! Broker consumption and delivery settlement.
//!
//! The gateway declares the topology, consumes the task queue under the
//! configured prefetch, and spawns one handler per delivery. Prefetch is
//! the only concurrency bound. A delivery is acked once every task in it
//! reached a terminal outcome and nacked with requeue otherwise. A handler
//! panic counts as a requeue, so every delivery frees its prefetch slot.

use async_trait::async_trait;
use futures_util::{FutureExt, StreamExt};
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicCancelOptions, BasicNackOptions};
use lapin::Channel;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use hermes_models::VideoTask;
use hermes_queue::{declare_topology, decode_tasks, start_consumer, QueueConfig};

use crate::dispatcher::TaskOutcome;
use crate::error::{DispatchResult, WorkerError, WorkerResult};
use crate::metrics;

/// Handles one decoded task.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle_task(&self, task: &VideoTask) -> DispatchResult<TaskOutcome>;
}

/// What to tell the broker about a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    Ack,
    Requeue,
}

/// Decode a delivery body and run its tasks in order.
///
/// Stops at the first dispatch error; the remaining tasks run again on
/// redelivery, where already handled ones are skipped. A panicking handler
/// yields [`DeliveryDecision::Requeue`].
pub async fn process_delivery(handler: &dyn TaskHandler, body: &[u8]) -> DeliveryDecision {
    match AssertUnwindSafe(run_tasks(handler, body)).catch_unwind().await {
        Ok(decision) => decision,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("Delivery handler panicked, requeueing message: {}", message);
            DeliveryDecision::Requeue
        }
    }
}

async fn run_tasks(handler: &dyn TaskHandler, body: &[u8]) -> DeliveryDecision {
    let tasks = match decode_tasks(body) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!("Failed to decode task message: {}", e);
            return DeliveryDecision::Requeue;
        }
    };

    if tasks.is_empty() {
        debug!("Empty task batch");
        return DeliveryDecision::Ack;
    }

    for task in &tasks {
        match handler.handle_task(task).await {
            Ok(outcome) => {
                debug!(task_type = %task.task_type, ?outcome, "Task handled");
            }
            Err(e) => {
                error!(
                    video_id = ?task.video_id,
                    task_type = %task.task_type,
                    "Task dispatch failed, requeueing message: {}", e
                );
                return DeliveryDecision::Requeue;
            }
        }
    }

    DeliveryDecision::Ack
}

/// Consumes the task queue and feeds deliveries to a [`TaskHandler`].
pub struct QueueGateway {
    channel: Channel,
    config: QueueConfig,
    handler: Arc<dyn TaskHandler>,
    shutdown_timeout: Duration,
}

impl QueueGateway {
    pub fn new(
        channel: Channel,
        config: QueueConfig,
        handler: Arc<dyn TaskHandler>,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            config,
            handler,
            shutdown_timeout,
        }
    }

    /// Consume until shutdown is signalled or the consumer fails, then wait
    /// up to the shutdown timeout for in-flight deliveries.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> WorkerResult<()> {
        declare_topology(&self.channel, &self.config).await?;

        let consumer_tag = format!("hermes-worker-{}", Uuid::new_v4());
        let mut consumer = start_consumer(&self.channel, &self.config, &consumer_tag).await?;
        let mut in_flight: JoinSet<()> = JoinSet::new();

        let result = loop {
            if *shutdown.borrow_and_update() {
                info!("Shutdown signal received, stopping consumer");
                break Ok(());
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown sender dropped, stopping consumer");
                        break Ok(());
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!("Delivery task failed: {}", e);
                    }
                }
                next = consumer.next() => {
                    match next {
                        Some(Ok(delivery)) => {
                            let handler = Arc::clone(&self.handler);
                            in_flight.spawn(settle_delivery(handler, delivery));
                        }
                        Some(Err(e)) => break Err(WorkerError::Amqp(e)),
                        None => break Err(WorkerError::ConsumerClosed),
                    }
                }
            }
        };

        if let Err(e) = self
            .channel
            .basic_cancel(&consumer_tag, BasicCancelOptions::default())
            .await
        {
            warn!("Failed to cancel consumer {}: {}", consumer_tag, e);
        }

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "Waiting for in-flight deliveries");
            let drained =
                tokio::time::timeout(self.shutdown_timeout, drain(&mut in_flight)).await;
            if drained.is_err() {
                // Unacked deliveries go back to the queue when the channel closes.
                warn!(
                    abandoned = in_flight.len(),
                    "Shutdown timeout elapsed, abandoning unacked deliveries"
                );
                in_flight.abort_all();
            }
        }

        info!("Queue gateway stopped");
        result
    }
}

async fn drain(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Delivery task failed: {}", e);
        }
    }
}

async fn settle_delivery(handler: Arc<dyn TaskHandler>, delivery: Delivery) {
    let delivery_tag = delivery.delivery_tag;
    let decision = process_delivery(handler.as_ref(), &delivery.data).await;

    let settled = match decision {
        DeliveryDecision::Ack => delivery.acker.ack(BasicAckOptions::default()).await,
        DeliveryDecision::Requeue => {
            metrics::record_requeue();
            delivery
                .acker
                .nack(BasicNackOptions {
                    requeue: true,
                    ..BasicNackOptions::default()
                })
                .await
        }
    };

    match settled {
        Ok(()) => debug!(delivery_tag, ?decision, "Delivery settled"),
        Err(e) => error!(delivery_tag, "Failed to settle delivery: {}", e),
    }
}
