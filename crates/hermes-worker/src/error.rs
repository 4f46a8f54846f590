//! Worker error types.

use std::time::Duration;
use thiserror::Error;

use hermes_db::TrackerError;
use hermes_media::MediaError;
use hermes_models::ConfigError;
use hermes_queue::QueueError;

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Failure while handling one task.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid task: {0}")]
    Config(#[from] ConfigError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] MediaError),

    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Task cancelled by shutdown")]
    Cancelled,

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Publish failed: {0}")]
    Publish(#[from] QueueError),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failure of the consume loop itself.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("Consumer stream closed by broker")]
    ConsumerClosed,
}
