//! Video task messages.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::config::{TrailerConfig, WebVttConfig};
use crate::error::{ConfigError, ConfigResult};

/// Database id of a video.
pub type VideoId = i64;

/// Kind of artifact a task produces.
///
/// Unrecognized kinds are kept rather than rejected at decode time so the
/// task can still be recorded as failed against its row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskKind {
    Poster,
    WebVtt,
    Trailer,
    Duration,
    Unknown(String),
}

impl TaskKind {
    pub fn as_str(&self) -> &str {
        match self {
            TaskKind::Poster => "poster",
            TaskKind::WebVtt => "webvtt",
            TaskKind::Trailer => "trailer",
            TaskKind::Duration => "duration",
            TaskKind::Unknown(other) => other,
        }
    }
}

impl From<String> for TaskKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "poster" => TaskKind::Poster,
            "webvtt" => TaskKind::WebVtt,
            "trailer" => TaskKind::Trailer,
            "duration" => TaskKind::Duration,
            _ => TaskKind::Unknown(s),
        }
    }
}

impl From<TaskKind> for String {
    fn from(kind: TaskKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A task as it arrives on the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTask {
    /// Absent in older producers; see [`VideoTask::resolve_video_id`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<VideoId>,
    /// Source file, relative to the uploads root
    pub file_path: String,
    pub task_type: TaskKind,
    /// Output directory, relative to the uploads root
    pub output_path: String,
    /// Per-kind configuration keyed by task type name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config: HashMap<String, Value>,
}

/// A task's kind with its effective configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskSpec {
    Poster,
    Storyboard(WebVttConfig),
    Trailer(TrailerConfig),
    Duration,
}

impl VideoTask {
    /// Create a task with an empty config map.
    pub fn new(
        video_id: VideoId,
        task_type: TaskKind,
        file_path: impl Into<String>,
        output_path: impl Into<String>,
    ) -> Self {
        Self {
            video_id: Some(video_id),
            file_path: file_path.into(),
            task_type,
            output_path: output_path.into(),
            config: HashMap::new(),
        }
    }

    /// Attach a per-kind config entry.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// The explicit video id, or the name of the directory holding the
    /// source file (uploads are stored as `<videoId>/<file>`).
    pub fn resolve_video_id(&self) -> ConfigResult<VideoId> {
        if let Some(id) = self.video_id {
            return Ok(id);
        }

        Path::new(&self.file_path)
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse().ok())
            .ok_or_else(|| ConfigError::MissingVideoId(self.file_path.clone()))
    }

    /// Decode the task kind and its configuration into a [`TaskSpec`].
    pub fn spec(&self) -> ConfigResult<TaskSpec> {
        match &self.task_type {
            TaskKind::Poster => Ok(TaskSpec::Poster),
            TaskKind::Duration => Ok(TaskSpec::Duration),
            TaskKind::WebVtt => WebVttConfig::from_value(self.config.get("webvtt"))
                .map(TaskSpec::Storyboard),
            TaskKind::Trailer => TrailerConfig::from_value(self.config.get("trailer"))
                .map(TaskSpec::Trailer),
            TaskKind::Unknown(other) => Err(ConfigError::UnknownTaskType(other.clone())),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<HashMap<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
