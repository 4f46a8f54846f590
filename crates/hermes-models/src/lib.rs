//! Shared data models for the Hermes media worker.
//!
//! This crate provides Serde-serializable types for:
//! - Video task messages and completion notifications
//! - Typed storyboard and trailer configuration
//! - Task/video status and the aggregation rule between them
//! - Encoding and artifact naming constants
//! - Secret lookup for service credentials

pub mod completion;
pub mod config;
pub mod encoding;
pub mod error;
pub mod status;
pub mod task;
pub mod utils;

// Re-export common types
pub use completion::{CompletionStatus, TaskCompletion};
pub use config::{
    AspectRatioStrategy, SelectionStrategy, TrailerConfig, WebVttConfig, MAX_TRAILER_CLIP_COUNT,
};
pub use error::{ConfigError, ConfigResult};
pub use status::{aggregate_status, TaskStatus, VideoStatus};
pub use task::{TaskKind, TaskSpec, VideoId, VideoTask};
pub use utils::secret_from_env;
