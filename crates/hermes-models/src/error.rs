//! Task configuration errors.

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A task that cannot be executed as described.
///
/// These are never retried: the same message will fail the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Unknown {kind} strategy: {value}")]
    UnknownStrategy { kind: &'static str, value: String },

    #[error("Invalid {task} config: {message}")]
    Invalid { task: &'static str, message: String },

    #[error("Cannot determine video id from path: {0}")]
    MissingVideoId(String),
}

impl ConfigError {
    pub fn invalid(task: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            task,
            message: message.into(),
        }
    }

    pub fn unknown_strategy(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownStrategy {
            kind,
            value: value.into(),
        }
    }
}
