//! Hermes media post-processing worker.
//!
//! This crate provides:
//! - The task dispatcher (timed attempts, linear backoff, completion)
//! - The queue gateway (consumption, ack/requeue decisions, drain on shutdown)
//! - Structured task logging and Prometheus metrics
//! - Exponential connection retry for startup

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod retry;

pub use config::WorkerConfig;
pub use dispatcher::{backoff_delay, TaskDispatcher, TaskOutcome};
pub use error::{DispatchError, DispatchResult, WorkerError, WorkerResult};
pub use gateway::{process_delivery, DeliveryDecision, QueueGateway, TaskHandler};
pub use logging::TaskLogger;
pub use retry::{retry_async, RetryConfig};
