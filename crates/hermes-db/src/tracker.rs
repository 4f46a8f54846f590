//! Transactional task/video status tracking.
//!
//! Task rows only move `pending -> processing -> {completed, failed}`. Each
//! transition is a conditional update that must hit exactly one row, so a
//! duplicate delivery finds the row in the wrong state and fails without
//! side effects.
//!
//! Completing a task recomputes the video's aggregate from every sibling
//! row inside the same transaction. The video row is locked first so two
//! siblings completing at once see each other's writes instead of both
//! reading a stale `processing` set.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use hermes_models::{aggregate_status, CompletionStatus, TaskKind, TaskStatus, VideoId, VideoStatus};

use crate::error::{TrackerError, TrackerResult};
use crate::DbPool;

/// Owns all writes to task and video rows.
#[async_trait]
pub trait CompletionTracker: Send + Sync {
    /// Move a task from `pending` to `processing`.
    async fn begin_task(&self, video_id: VideoId, task_type: &TaskKind) -> TrackerResult<()>;

    /// Move a task from `processing` to its terminal status and update the
    /// video's aggregate status if that is now terminal.
    ///
    /// Returns the aggregate computed after the update.
    async fn complete_task(
        &self,
        video_id: VideoId,
        task_type: &TaskKind,
        status: CompletionStatus,
        error: Option<String>,
    ) -> TrackerResult<VideoStatus>;

    /// Record the source duration on the video row.
    async fn update_video_duration(&self, video_id: VideoId, duration: f64) -> TrackerResult<()>;
}

/// [`CompletionTracker`] over the `video` and `video_task` tables.
#[derive(Clone)]
pub struct PgCompletionTracker {
    pool: DbPool,
}

impl PgCompletionTracker {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompletionTracker for PgCompletionTracker {
    async fn begin_task(&self, video_id: VideoId, task_type: &TaskKind) -> TrackerResult<()> {
        let result = sqlx::query(
            "UPDATE video_task \
             SET status = $1, started_at = NOW() \
             WHERE video_id = $2 AND task_type = $3 AND status = $4",
        )
        .bind(TaskStatus::Processing.as_str())
        .bind(video_id)
        .bind(task_type.as_str())
        .bind(TaskStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 1 {
            return Err(TrackerError::NotFoundOrAlreadyProcessing {
                video_id,
                task_type: task_type.to_string(),
            });
        }

        debug!(video_id, task_type = %task_type, "Task marked processing");
        Ok(())
    }

    async fn complete_task(
        &self,
        video_id: VideoId,
        task_type: &TaskKind,
        status: CompletionStatus,
        error: Option<String>,
    ) -> TrackerResult<VideoStatus> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM video WHERE id = $1 FOR UPDATE")
            .bind(video_id)
            .fetch_optional(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE video_task \
             SET status = $1, error = $2, completed_at = NOW() \
             WHERE video_id = $3 AND task_type = $4 AND status = $5",
        )
        .bind(TaskStatus::from(status).as_str())
        .bind(error.as_deref())
        .bind(video_id)
        .bind(task_type.as_str())
        .bind(TaskStatus::Processing.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() != 1 {
            // Dropping the transaction rolls it back
            return Err(TrackerError::NotFoundOrNotProcessing {
                video_id,
                task_type: task_type.to_string(),
            });
        }

        let rows: Vec<String> =
            sqlx::query_scalar("SELECT status FROM video_task WHERE video_id = $1")
                .bind(video_id)
                .fetch_all(&mut *tx)
                .await?;

        let statuses: Vec<TaskStatus> = rows
            .iter()
            .map(|s| {
                s.parse().unwrap_or_else(|_| {
                    warn!(video_id, status = %s, "Unrecognized task status, treating as pending");
                    TaskStatus::Pending
                })
            })
            .collect();

        let aggregate = aggregate_status(&statuses);

        if aggregate.is_terminal() {
            sqlx::query(
                "UPDATE video \
                 SET status = $1, processing_completed_at = NOW() \
                 WHERE id = $2",
            )
            .bind(aggregate.as_str())
            .bind(video_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        if aggregate.is_terminal() {
            info!(video_id, status = %aggregate, "Video processing finished");
        }

        Ok(aggregate)
    }

    async fn update_video_duration(&self, video_id: VideoId, duration: f64) -> TrackerResult<()> {
        sqlx::query("UPDATE video SET video_duration = $1 WHERE id = $2")
            .bind(duration)
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
