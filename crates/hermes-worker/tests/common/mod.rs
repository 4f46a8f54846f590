//! Shared fakes and mocks for worker tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use hermes_db::{CompletionTracker, TrackerError, TrackerResult};
use hermes_media::{MediaError, MediaResult, MediaSynthesizer};
use hermes_models::{
    aggregate_status, CompletionStatus, TaskCompletion, TaskKind, TaskStatus, TrailerConfig,
    VideoId, VideoStatus, WebVttConfig,
};
use hermes_queue::{CompletionPublisher, QueueError, QueueResult};
use hermes_worker::{TaskDispatcher, WorkerConfig};

mock! {
    pub Synthesizer {}

    #[async_trait]
    impl MediaSynthesizer for Synthesizer {
        async fn poster(&self, input: &Path, output: &Path) -> MediaResult<()>;
        async fn storyboard(&self, input: &Path, output_dir: &Path, config: &WebVttConfig) -> MediaResult<()>;
        async fn trailer(&self, input: &Path, output: &Path, config: &TrailerConfig) -> MediaResult<()>;
        async fn probe_duration(&self, input: &Path) -> MediaResult<f64>;
    }
}

mock! {
    pub Publisher {}

    #[async_trait]
    impl CompletionPublisher for Publisher {
        async fn publish(&self, completion: &TaskCompletion) -> QueueResult<()>;
    }
}

pub fn ffmpeg_error(message: &str) -> MediaError {
    MediaError::ffmpeg_failed(message, Some("conversion failed".into()), Some(1))
}

/// Worker config with a short timeout and a 100ms backoff unit.
pub fn test_config() -> WorkerConfig {
    WorkerConfig {
        task_timeout: Duration::from_secs(5),
        max_retries: 3,
        retry_base_delay: Duration::from_millis(100),
        uploads_root: PathBuf::from("/uploads"),
        ..WorkerConfig::default()
    }
}

#[derive(Default)]
struct TrackerState {
    tasks: HashMap<(VideoId, String), TaskStatus>,
    errors: HashMap<(VideoId, String), String>,
    videos: HashMap<VideoId, VideoStatus>,
    durations: HashMap<VideoId, f64>,
}

/// In-memory tracker with the same transition and aggregation rules as the
/// Postgres one.
#[derive(Default)]
pub struct InMemoryTracker {
    state: Mutex<TrackerState>,
}

impl InMemoryTracker {
    /// Seed `pending` rows for each kind of `video_id`.
    pub fn with_tasks(video_id: VideoId, kinds: &[&str]) -> Self {
        let tracker = Self::default();
        for kind in kinds {
            tracker.set_status(video_id, kind, TaskStatus::Pending);
        }
        tracker
    }

    pub fn set_status(&self, video_id: VideoId, kind: &str, status: TaskStatus) {
        let mut state = self.state.lock().unwrap();
        state.tasks.insert((video_id, kind.to_string()), status);
    }

    pub fn task_status(&self, video_id: VideoId, kind: &str) -> Option<TaskStatus> {
        let state = self.state.lock().unwrap();
        state.tasks.get(&(video_id, kind.to_string())).copied()
    }

    pub fn task_error(&self, video_id: VideoId, kind: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.errors.get(&(video_id, kind.to_string())).cloned()
    }

    pub fn video_status(&self, video_id: VideoId) -> Option<VideoStatus> {
        self.state.lock().unwrap().videos.get(&video_id).copied()
    }

    pub fn duration(&self, video_id: VideoId) -> Option<f64> {
        self.state.lock().unwrap().durations.get(&video_id).copied()
    }
}

#[async_trait]
impl CompletionTracker for InMemoryTracker {
    async fn begin_task(&self, video_id: VideoId, task_type: &TaskKind) -> TrackerResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (video_id, task_type.to_string());
        match state.tasks.get(&key) {
            Some(TaskStatus::Pending) => {
                state.tasks.insert(key, TaskStatus::Processing);
                Ok(())
            }
            _ => Err(TrackerError::NotFoundOrAlreadyProcessing {
                video_id,
                task_type: task_type.to_string(),
            }),
        }
    }

    async fn complete_task(
        &self,
        video_id: VideoId,
        task_type: &TaskKind,
        status: CompletionStatus,
        error: Option<String>,
    ) -> TrackerResult<VideoStatus> {
        let mut state = self.state.lock().unwrap();
        let key = (video_id, task_type.to_string());
        if state.tasks.get(&key) != Some(&TaskStatus::Processing) {
            return Err(TrackerError::NotFoundOrNotProcessing {
                video_id,
                task_type: task_type.to_string(),
            });
        }

        state.tasks.insert(key.clone(), status.into());
        if let Some(error) = error {
            state.errors.insert(key, error);
        }

        let aggregate = aggregate_status(
            state
                .tasks
                .iter()
                .filter(|((id, _), _)| *id == video_id)
                .map(|(_, status)| status),
        );
        if aggregate.is_terminal() {
            state.videos.insert(video_id, aggregate);
        }
        Ok(aggregate)
    }

    async fn update_video_duration(&self, video_id: VideoId, duration: f64) -> TrackerResult<()> {
        self.state.lock().unwrap().durations.insert(video_id, duration);
        Ok(())
    }
}

/// Publisher that records completions, optionally failing every call.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<TaskCompletion>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<TaskCompletion> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionPublisher for RecordingPublisher {
    async fn publish(&self, completion: &TaskCompletion) -> QueueResult<()> {
        if self.fail {
            return Err(QueueError::PublishNacked(completion.routing_key()));
        }
        self.published.lock().unwrap().push(completion.clone());
        Ok(())
    }
}

/// Synthesizer whose every call sleeps for `delay` before succeeding.
pub struct SlowSynthesizer {
    pub delay: Duration,
    pub calls: AtomicU32,
}

impl SlowSynthesizer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn work(&self) -> MediaResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[async_trait]
impl MediaSynthesizer for SlowSynthesizer {
    async fn poster(&self, _input: &Path, _output: &Path) -> MediaResult<()> {
        self.work().await
    }

    async fn storyboard(&self, _input: &Path, _output_dir: &Path, _config: &WebVttConfig) -> MediaResult<()> {
        self.work().await
    }

    async fn trailer(&self, _input: &Path, _output: &Path, _config: &TrailerConfig) -> MediaResult<()> {
        self.work().await
    }

    async fn probe_duration(&self, _input: &Path) -> MediaResult<f64> {
        self.work().await.map(|_| 60.0)
    }
}

/// Dispatcher over the given collaborators with a shutdown sender that
/// stays alive for the returned lifetime.
pub fn dispatcher(
    config: &WorkerConfig,
    synthesizer: Arc<dyn MediaSynthesizer>,
    tracker: Arc<dyn CompletionTracker>,
    publisher: Arc<dyn CompletionPublisher>,
) -> (TaskDispatcher, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    (TaskDispatcher::new(config, synthesizer, tracker, publisher, rx), tx)
}
