//! RabbitMQ plumbing for the Hermes worker.
//!
//! This crate provides:
//! - Broker configuration and connection
//! - Exchange/queue declaration, QoS and consumption
//! - Decoding of single-task and batched task messages
//! - Completion publishing

pub mod broker;
pub mod config;
pub mod error;
pub mod message;
pub mod publisher;
pub mod topology;

pub use broker::Broker;
pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use message::decode_tasks;
pub use publisher::{AmqpPublisher, CompletionPublisher};
pub use topology::{declare_topology, start_consumer};
