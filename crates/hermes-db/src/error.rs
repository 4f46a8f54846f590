//! Completion tracker errors.

use thiserror::Error;

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Task {task_type} of video {video_id} not found or already processing")]
    NotFoundOrAlreadyProcessing { video_id: i64, task_type: String },

    #[error("Task {task_type} of video {video_id} not found or not processing")]
    NotFoundOrNotProcessing { video_id: i64, task_type: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TrackerError {
    /// The row was not in the expected prior status.
    ///
    /// Redelivered messages hit this; it is not a storage failure.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            TrackerError::NotFoundOrAlreadyProcessing { .. }
                | TrackerError::NotFoundOrNotProcessing { .. }
        )
    }
}
