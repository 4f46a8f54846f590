//! Task and video processing status.
//!
//! A video's status is derived from the statuses of all of its task rows.
//! [`aggregate_status`] is the single definition of that rule; the tracker
//! recomputes it from the full sibling set on every completion so the result
//! does not depend on the order in which tasks finish.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of one (video, task kind) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created by the producer, not yet picked up
    #[default]
    Pending,
    /// A worker has begun the task
    Processing,
    /// Artifact produced and verified
    Completed,
    /// Retries exhausted or configuration rejected
    Failed,
}

impl TaskStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// Aggregate status of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Processing,
    Completed,
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Only terminal aggregates are written back to the video row.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compute a video's status from all of its task statuses.
///
/// `failed` if any task failed, `completed` if every task completed,
/// `processing` otherwise.
pub fn aggregate_status<'a, I>(statuses: I) -> VideoStatus
where
    I: IntoIterator<Item = &'a TaskStatus>,
{
    let mut all_completed = true;
    for status in statuses {
        match status {
            TaskStatus::Failed => return VideoStatus::Failed,
            TaskStatus::Completed => {}
            TaskStatus::Pending | TaskStatus::Processing => all_completed = false,
        }
    }

    if all_completed {
        VideoStatus::Completed
    } else {
        VideoStatus::Processing
    }
}
