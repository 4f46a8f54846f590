//! FFmpeg CLI wrapper for media post-processing.
//!
//! This crate provides:
//! - FFmpeg command builder and runner (killed on timeout/drop)
//! - FFprobe metadata probing
//! - Poster, storyboard + WebVTT cue, and trailer synthesis
//! - The [`MediaSynthesizer`] seam used by the task dispatcher

pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod poster;
pub mod probe;
pub mod storyboard;
pub mod synthesizer;
pub mod trailer;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use poster::generate_poster;
pub use probe::{get_duration, probe_video, VideoInfo};
pub use storyboard::{format_cue_time, generate_storyboard, StoryboardLayout, StoryboardOutput};
pub use synthesizer::{FfmpegSynthesizer, MediaSynthesizer};
pub use trailer::{generate_trailer, select_clip_starts};
