//! Per-task orchestration.
//!
//! A task moves through `begin -> attempt(1..=max_retries) -> complete ->
//! publish`. Each attempt is bounded by the task timeout; dropping a
//! timed-out attempt kills the ffmpeg child. Failed attempts back off
//! linearly (`base * attempt`).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

use hermes_db::CompletionTracker;
use hermes_media::MediaSynthesizer;
use hermes_models::encoding::{POSTER_FILE, TRAILER_FILE};
use hermes_models::{CompletionStatus, TaskCompletion, TaskSpec, VideoId, VideoTask};
use hermes_queue::CompletionPublisher;

use crate::config::WorkerConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::gateway::TaskHandler;
use crate::logging::TaskLogger;
use crate::metrics;

/// How a task left the dispatcher without a dispatch error.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Artifact produced, recorded and published.
    Completed,
    /// Recorded and published as failed.
    Failed { error: String },
    /// The row was not in the expected state; a redelivery of a task that
    /// was already handled.
    AlreadyHandled,
    /// The task could not be attributed to a video, so there is no row to
    /// record it against.
    Discarded { reason: String },
}

/// Delay after failed attempt `attempt` (1-based).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

/// Runs tasks against the synthesizer, tracker and publisher.
pub struct TaskDispatcher {
    task_timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
    uploads_root: PathBuf,
    synthesizer: Arc<dyn MediaSynthesizer>,
    tracker: Arc<dyn CompletionTracker>,
    publisher: Arc<dyn CompletionPublisher>,
    shutdown: watch::Receiver<bool>,
}

impl TaskDispatcher {
    pub fn new(
        config: &WorkerConfig,
        synthesizer: Arc<dyn MediaSynthesizer>,
        tracker: Arc<dyn CompletionTracker>,
        publisher: Arc<dyn CompletionPublisher>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            task_timeout: config.task_timeout,
            max_retries: config.max_retries.max(1),
            retry_base_delay: config.retry_base_delay,
            uploads_root: config.uploads_root.clone(),
            synthesizer,
            tracker,
            publisher,
            shutdown,
        }
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolve a task-relative path under the uploads root.
    fn resolve(&self, relative: &str) -> PathBuf {
        self.uploads_root.join(relative.trim_start_matches('/'))
    }

    async fn dispatch(
        &self,
        video_id: VideoId,
        task: &VideoTask,
        logger: &TaskLogger,
    ) -> DispatchResult<TaskOutcome> {
        if self.is_shutting_down() {
            return Err(DispatchError::Cancelled);
        }

        match self.tracker.begin_task(video_id, &task.task_type).await {
            Ok(()) => {}
            Err(e) if e.is_state_conflict() => {
                info!("Task already handled, skipping: {}", e);
                return Ok(TaskOutcome::AlreadyHandled);
            }
            Err(e) => return Err(e.into()),
        }

        logger.log_start(&task.file_path);
        let started = Instant::now();

        // Config errors are final; they are recorded without any attempt.
        let (result, attempts) = match task.spec() {
            Ok(spec) => self.run_attempts(video_id, task, &spec, logger).await,
            Err(e) => (Err(DispatchError::from(e)), 0),
        };

        let (status, error) = match &result {
            Ok(()) => (CompletionStatus::Completed, None),
            Err(e) => (CompletionStatus::Failed, Some(e.to_string())),
        };

        let video_status = match self
            .tracker
            .complete_task(video_id, &task.task_type, status, error.clone())
            .await
        {
            Ok(video_status) => video_status,
            Err(e) if e.is_state_conflict() => {
                logger.log_warning(&format!("Completion conflicted: {}", e));
                return Ok(TaskOutcome::AlreadyHandled);
            }
            Err(e) => return Err(e.into()),
        };

        if video_status.is_terminal() {
            info!(video_status = %video_status, "Video processing finished");
        } else {
            debug!(video_status = %video_status, "Video still processing");
        }

        let elapsed = started.elapsed();
        let completion = match &error {
            None => {
                logger.log_completion(attempts, elapsed);
                metrics::record_task_completed(task.task_type.as_str(), elapsed.as_secs_f64());
                TaskCompletion::completed(video_id, task)
            }
            Some(message) => {
                logger.log_failure(attempts, message);
                metrics::record_task_failed(task.task_type.as_str(), elapsed.as_secs_f64());
                TaskCompletion::failed(video_id, task, message.clone())
            }
        };

        self.publisher.publish(&completion).await?;

        match (result, error) {
            (Err(DispatchError::Cancelled), _) => Err(DispatchError::Cancelled),
            (_, Some(error)) => Ok(TaskOutcome::Failed { error }),
            (_, None) => Ok(TaskOutcome::Completed),
        }
    }

    /// Attempt synthesis until one attempt succeeds, the attempts run out,
    /// or shutdown interrupts a backoff. Returns the final result and the
    /// number of attempts made.
    async fn run_attempts(
        &self,
        video_id: VideoId,
        task: &VideoTask,
        spec: &TaskSpec,
        logger: &TaskLogger,
    ) -> (DispatchResult<()>, u32) {
        let input = self.resolve(&task.file_path);
        let output_dir = self.resolve(&task.output_path);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            metrics::record_attempt(task.task_type.as_str());

            let result = match tokio::time::timeout(
                self.task_timeout,
                self.attempt(video_id, spec, &input, &output_dir),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(DispatchError::Timeout(self.task_timeout)),
            };

            let error = match result {
                Ok(()) => return (Ok(()), attempt),
                Err(e) if attempt >= self.max_retries => return (Err(e), attempt),
                Err(e) => e,
            };

            if self.is_shutting_down() {
                logger.log_warning(&format!("Shutdown after failed attempt {}: {}", attempt, error));
                return (Err(DispatchError::Cancelled), attempt);
            }

            let delay = backoff_delay(self.retry_base_delay, attempt);
            logger.log_retry(attempt, self.max_retries, delay, &error.to_string());

            let mut shutdown = self.shutdown.clone();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_signalled(&mut shutdown) => {
                    logger.log_warning("Shutdown during backoff");
                    return (Err(DispatchError::Cancelled), attempt);
                }
            }
        }
    }

    /// One synthesis attempt for `spec`.
    async fn attempt(
        &self,
        video_id: VideoId,
        spec: &TaskSpec,
        input: &Path,
        output_dir: &Path,
    ) -> DispatchResult<()> {
        match spec {
            TaskSpec::Poster => {
                self.synthesizer
                    .poster(input, &output_dir.join(POSTER_FILE))
                    .await?
            }
            TaskSpec::Storyboard(config) => {
                self.synthesizer.storyboard(input, output_dir, config).await?
            }
            TaskSpec::Trailer(config) => {
                self.synthesizer
                    .trailer(input, &output_dir.join(TRAILER_FILE), config)
                    .await?
            }
            TaskSpec::Duration => {
                let duration = self.synthesizer.probe_duration(input).await?;
                self.tracker.update_video_duration(video_id, duration).await?;
                debug!(duration, "Recorded video duration");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for TaskDispatcher {
    async fn handle_task(&self, task: &VideoTask) -> DispatchResult<TaskOutcome> {
        let video_id = match task.resolve_video_id() {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    task_type = %task.task_type,
                    file_path = %task.file_path,
                    "Discarding task: {}", e
                );
                return Ok(TaskOutcome::Discarded {
                    reason: e.to_string(),
                });
            }
        };

        let logger = TaskLogger::new(video_id, &task.task_type);
        let span = logger.create_span();
        self.dispatch(video_id, task, &logger).instrument(span).await
    }
}

/// Resolves once the shutdown flag is set. Never resolves if the sender is
/// gone without having set it.
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_shutdown_signalled_after_flag() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        shutdown_signalled(&mut rx).await;
    }
}
