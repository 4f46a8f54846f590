//! Structured task logging.
//!
//! Every log line for a task carries `video_id` and `task_type` so a
//! video's processing can be followed across deliveries and workers.

use std::time::Duration;
use tracing::{error, info, warn, Span};

use hermes_models::{TaskKind, VideoId};

/// Logger bound to one (video, task kind) pair.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    video_id: VideoId,
    task_type: String,
}

impl TaskLogger {
    pub fn new(video_id: VideoId, task_type: &TaskKind) -> Self {
        Self {
            video_id,
            task_type: task_type.to_string(),
        }
    }

    pub fn log_start(&self, file_path: &str) {
        info!(
            video_id = self.video_id,
            task_type = %self.task_type,
            "Task started: {}", file_path
        );
    }

    /// A failed attempt that will be retried after `delay`.
    pub fn log_retry(&self, attempt: u32, max_attempts: u32, delay: Duration, message: &str) {
        warn!(
            video_id = self.video_id,
            task_type = %self.task_type,
            attempt,
            max_attempts,
            "Attempt failed, retrying in {:?}: {}", delay, message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = self.video_id,
            task_type = %self.task_type,
            "Task warning: {}", message
        );
    }

    pub fn log_failure(&self, attempts: u32, message: &str) {
        error!(
            video_id = self.video_id,
            task_type = %self.task_type,
            attempts,
            "Task failed: {}", message
        );
    }

    pub fn log_completion(&self, attempts: u32, elapsed: Duration) {
        info!(
            video_id = self.video_id,
            task_type = %self.task_type,
            attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            "Task completed"
        );
    }

    /// Span enclosing all work for this task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            video_id = self.video_id,
            task_type = %self.task_type
        )
    }
}

