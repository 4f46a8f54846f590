//! Typed storyboard and trailer configuration.
//!
//! Producers send these as loosely-typed JSON objects under the task's
//! `config` map. Each is decoded once into a raw form with every field
//! optional, then resolved into the effective configuration: absent fields
//! take the defaults below and the result is validated. Nothing downstream
//! re-applies defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// Storyboard defaults
pub const DEFAULT_WEBVTT_INTERVAL: f64 = 10.0;
pub const DEFAULT_WEBVTT_COLUMNS: u32 = 5;
pub const DEFAULT_WEBVTT_WIDTH: u32 = 160;
pub const DEFAULT_WEBVTT_HEIGHT: u32 = 90;
pub const DEFAULT_WEBVTT_MAX_DURATION: f64 = 3600.0;

/// Trailer defaults
pub const DEFAULT_TRAILER_CLIP_DURATION: f64 = 3.0;
pub const DEFAULT_TRAILER_CLIP_COUNT: u32 = 10;
pub const DEFAULT_TRAILER_WIDTH: u32 = 1280;
pub const DEFAULT_TRAILER_HEIGHT: u32 = 720;

/// Upper bound on `clipCount`; each clip is a separate ffmpeg run.
pub const MAX_TRAILER_CLIP_COUNT: u32 = 100;

/// Effective storyboard (sprite sheet + cue file) configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebVttConfig {
    /// Seconds between sampled frames
    pub interval: f64,
    /// Tiles per sprite row
    pub num_columns: u32,
    /// Tile width in pixels
    pub width: u32,
    /// Tile height in pixels
    pub height: u32,
    /// Upper bound on covered duration, 0 = unbounded
    pub max_duration: f64,
}

impl Default for WebVttConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WEBVTT_INTERVAL,
            num_columns: DEFAULT_WEBVTT_COLUMNS,
            width: DEFAULT_WEBVTT_WIDTH,
            height: DEFAULT_WEBVTT_HEIGHT,
            max_duration: DEFAULT_WEBVTT_MAX_DURATION,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWebVttConfig {
    interval: Option<f64>,
    num_columns: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    max_duration: Option<f64>,
}

impl WebVttConfig {
    const TASK: &'static str = "webvtt";

    /// Resolve the effective config from the task's `config.webvtt` entry.
    ///
    /// A missing or null entry yields the defaults.
    pub fn from_value(value: Option<&Value>) -> ConfigResult<Self> {
        let raw: RawWebVttConfig = decode_raw(Self::TASK, value)?;
        let defaults = Self::default();

        let interval = raw.interval.unwrap_or(defaults.interval);
        if !(interval > 0.0) {
            return Err(ConfigError::invalid(Self::TASK, "interval must be positive"));
        }

        let max_duration = raw.max_duration.unwrap_or(defaults.max_duration);
        if !(max_duration >= 0.0) {
            return Err(ConfigError::invalid(Self::TASK, "maxDuration must not be negative"));
        }

        Ok(Self {
            interval,
            num_columns: positive_int(Self::TASK, "numColumns", raw.num_columns, defaults.num_columns)?,
            width: positive_int(Self::TASK, "width", raw.width, defaults.width)?,
            height: positive_int(Self::TASK, "height", raw.height, defaults.height)?,
            max_duration,
        })
    }
}

/// How trailer clip start offsets are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Evenly spaced across the source
    #[default]
    Uniform,
    /// Random offsets, sorted chronologically
    Random,
}

impl FromStr for SelectionStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(Self::Uniform),
            "random" => Ok(Self::Random),
            other => Err(ConfigError::unknown_strategy("selection", other)),
        }
    }
}

/// How trailer clips are fitted to the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatioStrategy {
    /// Preserve aspect ratio and pad
    #[default]
    Fit,
    /// Preserve aspect ratio and crop to fill
    Crop,
    /// Scale straight to the box
    Stretch,
}

impl FromStr for AspectRatioStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fit" => Ok(Self::Fit),
            "crop" => Ok(Self::Crop),
            "stretch" => Ok(Self::Stretch),
            other => Err(ConfigError::unknown_strategy("aspect ratio", other)),
        }
    }
}

/// Effective trailer configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailerConfig {
    /// Length of each clip in seconds
    pub clip_duration: f64,
    /// Number of clips to select
    pub clip_count: u32,
    pub selection_strategy: SelectionStrategy,
    /// Target box width in pixels
    pub width: u32,
    /// Target box height in pixels
    pub height: u32,
    /// Informational only; the trailer length follows from the clips
    pub target_duration: f64,
    pub aspect_ratio_strategy: AspectRatioStrategy,
    /// Box used for portrait sources under `fit`
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for TrailerConfig {
    fn default() -> Self {
        Self {
            clip_duration: DEFAULT_TRAILER_CLIP_DURATION,
            clip_count: DEFAULT_TRAILER_CLIP_COUNT,
            selection_strategy: SelectionStrategy::default(),
            width: DEFAULT_TRAILER_WIDTH,
            height: DEFAULT_TRAILER_HEIGHT,
            target_duration: DEFAULT_TRAILER_CLIP_DURATION * DEFAULT_TRAILER_CLIP_COUNT as f64,
            aspect_ratio_strategy: AspectRatioStrategy::default(),
            max_width: DEFAULT_TRAILER_WIDTH,
            max_height: DEFAULT_TRAILER_HEIGHT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrailerConfig {
    clip_duration: Option<f64>,
    clip_count: Option<f64>,
    selection_strategy: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    target_duration: Option<f64>,
    aspect_ratio_strategy: Option<String>,
    max_width: Option<f64>,
    max_height: Option<f64>,
}

impl TrailerConfig {
    const TASK: &'static str = "trailer";

    /// Resolve the effective config from the task's `config.trailer` entry.
    ///
    /// A missing or null entry yields the defaults. `maxWidth`/`maxHeight`
    /// default to the resolved `width`/`height`.
    pub fn from_value(value: Option<&Value>) -> ConfigResult<Self> {
        let raw: RawTrailerConfig = decode_raw(Self::TASK, value)?;
        let defaults = Self::default();

        let clip_duration = raw.clip_duration.unwrap_or(defaults.clip_duration);
        if !(clip_duration > 0.0) {
            return Err(ConfigError::invalid(Self::TASK, "clipDuration must be positive"));
        }

        let clip_count = positive_int(Self::TASK, "clipCount", raw.clip_count, defaults.clip_count)?;
        if clip_count > MAX_TRAILER_CLIP_COUNT {
            return Err(ConfigError::invalid(
                Self::TASK,
                format!(
                    "clipCount must be at most {}, got {}",
                    MAX_TRAILER_CLIP_COUNT, clip_count
                ),
            ));
        }
        let width = positive_int(Self::TASK, "width", raw.width, defaults.width)?;
        let height = positive_int(Self::TASK, "height", raw.height, defaults.height)?;

        let selection_strategy = match non_empty(raw.selection_strategy) {
            Some(s) => s.parse()?,
            None => defaults.selection_strategy,
        };
        let aspect_ratio_strategy = match non_empty(raw.aspect_ratio_strategy) {
            Some(s) => s.parse()?,
            None => defaults.aspect_ratio_strategy,
        };

        Ok(Self {
            clip_duration,
            clip_count,
            selection_strategy,
            width,
            height,
            target_duration: raw
                .target_duration
                .unwrap_or(clip_duration * clip_count as f64),
            aspect_ratio_strategy,
            max_width: positive_int(Self::TASK, "maxWidth", raw.max_width, width)?,
            max_height: positive_int(Self::TASK, "maxHeight", raw.max_height, height)?,
        })
    }
}

fn decode_raw<T>(task: &'static str, value: Option<&Value>) -> ConfigResult<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => T::deserialize(v).map_err(|e| ConfigError::invalid(task, e.to_string())),
    }
}

/// JSON numbers arrive as floats from some producers; fractional parts are
/// truncated.
fn positive_int(
    task: &'static str,
    field: &str,
    value: Option<f64>,
    default: u32,
) -> ConfigResult<u32> {
    match value {
        None => Ok(default),
        Some(v) if v >= 1.0 && v <= u32::MAX as f64 => Ok(v as u32),
        Some(v) => Err(ConfigError::invalid(
            task,
            format!("{} must be a positive integer, got {}", field, v),
        )),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webvtt_defaults_when_absent() {
        let config = WebVttConfig::from_value(None).unwrap();
        assert_eq!(config, WebVttConfig::default());

        let config = WebVttConfig::from_value(Some(&Value::Null)).unwrap();
        assert_eq!(config.num_columns, 5);
    }

    #[test]
    fn test_webvtt_partial_config_keeps_defaults() {
        let value = json!({ "interval": 2, "numColumns": 4 });
        let config = WebVttConfig::from_value(Some(&value)).unwrap();

        assert_eq!(config.interval, 2.0);
        assert_eq!(config.num_columns, 4);
        assert_eq!(config.width, 160);
        assert_eq!(config.height, 90);
        assert_eq!(config.max_duration, 3600.0);
    }

    #[test]
    fn test_webvtt_rejects_non_positive_values() {
        let value = json!({ "interval": 0 });
        assert!(matches!(
            WebVttConfig::from_value(Some(&value)),
            Err(ConfigError::Invalid { task: "webvtt", .. })
        ));

        let value = json!({ "width": -160 });
        assert!(WebVttConfig::from_value(Some(&value)).is_err());

        let value = json!({ "numColumns": "five" });
        assert!(WebVttConfig::from_value(Some(&value)).is_err());
    }

    #[test]
    fn test_webvtt_accepts_float_encoded_integers() {
        let value = json!({ "width": 320.0, "height": 180.0 });
        let config = WebVttConfig::from_value(Some(&value)).unwrap();
        assert_eq!((config.width, config.height), (320, 180));
    }

    #[test]
    fn test_trailer_defaults() {
        let config = TrailerConfig::from_value(None).unwrap();
        assert_eq!(config.selection_strategy, SelectionStrategy::Uniform);
        assert_eq!(config.aspect_ratio_strategy, AspectRatioStrategy::Fit);
        assert_eq!(config.clip_count, 10);
        assert_eq!(config.max_width, 1280);
        assert_eq!(config.max_height, 720);
    }

    #[test]
    fn test_trailer_max_box_follows_width_height() {
        let value = json!({ "width": 640, "height": 360 });
        let config = TrailerConfig::from_value(Some(&value)).unwrap();
        assert_eq!((config.max_width, config.max_height), (640, 360));

        let value = json!({ "width": 640, "height": 360, "maxWidth": 720, "maxHeight": 1280 });
        let config = TrailerConfig::from_value(Some(&value)).unwrap();
        assert_eq!((config.max_width, config.max_height), (720, 1280));
    }

    #[test]
    fn test_trailer_strategies() {
        let value = json!({ "selectionStrategy": "random", "aspectRatioStrategy": "crop" });
        let config = TrailerConfig::from_value(Some(&value)).unwrap();
        assert_eq!(config.selection_strategy, SelectionStrategy::Random);
        assert_eq!(config.aspect_ratio_strategy, AspectRatioStrategy::Crop);

        let value = json!({ "aspectRatioStrategy": "" });
        let config = TrailerConfig::from_value(Some(&value)).unwrap();
        assert_eq!(config.aspect_ratio_strategy, AspectRatioStrategy::Fit);
    }

    #[test]
    fn test_trailer_unknown_strategy_is_error() {
        let value = json!({ "selectionStrategy": "best" });
        assert_eq!(
            TrailerConfig::from_value(Some(&value)),
            Err(ConfigError::unknown_strategy("selection", "best"))
        );

        let value = json!({ "aspectRatioStrategy": "zoom" });
        assert!(matches!(
            TrailerConfig::from_value(Some(&value)),
            Err(ConfigError::UnknownStrategy { kind: "aspect ratio", .. })
        ));
    }

    #[test]
    fn test_trailer_target_duration_is_informational() {
        let value = json!({ "clipDuration": 2, "clipCount": 4 });
        let config = TrailerConfig::from_value(Some(&value)).unwrap();
        assert_eq!(config.target_duration, 8.0);
    }

    #[test]
    fn test_trailer_clip_count_is_bounded() {
        let value = json!({ "clipCount": MAX_TRAILER_CLIP_COUNT });
        let config = TrailerConfig::from_value(Some(&value)).unwrap();
        assert_eq!(config.clip_count, MAX_TRAILER_CLIP_COUNT);

        let value = json!({ "clipCount": 4294967295u64 });
        assert!(matches!(
            TrailerConfig::from_value(Some(&value)),
            Err(ConfigError::Invalid { task: "trailer", .. })
        ));

        let value = json!({ "clipCount": MAX_TRAILER_CLIP_COUNT + 1 });
        assert!(TrailerConfig::from_value(Some(&value)).is_err());
    }
}
