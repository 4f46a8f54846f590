//! Completion notifications published after a task reaches a terminal state.

use serde::{Deserialize, Serialize};

use crate::status::TaskStatus;
use crate::task::{TaskKind, VideoId, VideoTask};

/// Terminal outcome of a task as seen by downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Failed,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::Failed => "failed",
        }
    }
}

impl From<CompletionStatus> for TaskStatus {
    fn from(status: CompletionStatus) -> Self {
        match status {
            CompletionStatus::Completed => TaskStatus::Completed,
            CompletionStatus::Failed => TaskStatus::Failed,
        }
    }
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire-level completion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletion {
    pub video_id: VideoId,
    pub task_type: TaskKind,
    pub file_path: String,
    pub output_path: String,
    pub status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskCompletion {
    /// Successful completion for `task`.
    pub fn completed(video_id: VideoId, task: &VideoTask) -> Self {
        Self::from_task(video_id, task, CompletionStatus::Completed, None)
    }

    /// Failed completion for `task` carrying the error message.
    pub fn failed(video_id: VideoId, task: &VideoTask, error: impl Into<String>) -> Self {
        Self::from_task(video_id, task, CompletionStatus::Failed, Some(error.into()))
    }

    fn from_task(
        video_id: VideoId,
        task: &VideoTask,
        status: CompletionStatus,
        error: Option<String>,
    ) -> Self {
        Self {
            video_id,
            task_type: task.task_type.clone(),
            file_path: task.file_path.clone(),
            output_path: task.output_path.clone(),
            status,
            error,
        }
    }

    /// Routing key under which this completion is published.
    pub fn routing_key(&self) -> String {
        format!("video.completion.{}.{}", self.video_id, self.task_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_omits_error() {
        let task = VideoTask::new(9, TaskKind::Poster, "9/in.mp4", "9");
        let json = serde_json::to_value(TaskCompletion::completed(9, &task)).unwrap();

        assert_eq!(json["videoId"], 9);
        assert_eq!(json["taskType"], "poster");
        assert_eq!(json["outputPath"], "9");
        assert_eq!(json["status"], "completed");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failed_carries_error() {
        let task = VideoTask::new(9, TaskKind::Trailer, "9/in.mp4", "9");
        let completion = TaskCompletion::failed(9, &task, "ffmpeg exited with 1");
        let json = serde_json::to_value(&completion).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "ffmpeg exited with 1");
        assert_eq!(completion.routing_key(), "video.completion.9.trailer");
    }

    #[test]
    fn test_completion_status_maps_to_task_status() {
        assert_eq!(TaskStatus::from(CompletionStatus::Completed), TaskStatus::Completed);
        assert_eq!(TaskStatus::from(CompletionStatus::Failed), TaskStatus::Failed);
    }
}
