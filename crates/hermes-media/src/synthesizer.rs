//! The synthesis seam between task dispatch and ffmpeg.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use hermes_models::{TrailerConfig, WebVttConfig};

use crate::command::{check_ffmpeg, check_ffprobe};
use crate::error::MediaResult;
use crate::poster::generate_poster;
use crate::probe::get_duration;
use crate::storyboard::generate_storyboard;
use crate::trailer::generate_trailer;

/// Produces one artifact per call.
///
/// Implementations do not retry; a failed call is one failed attempt.
#[async_trait]
pub trait MediaSynthesizer: Send + Sync {
    /// Write a poster image to `output`.
    async fn poster(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Write the sprite sheet and cue file into `output_dir`.
    async fn storyboard(&self, input: &Path, output_dir: &Path, config: &WebVttConfig) -> MediaResult<()>;

    /// Write a trailer to `output`.
    async fn trailer(&self, input: &Path, output: &Path, config: &TrailerConfig) -> MediaResult<()>;

    /// Source duration in seconds.
    async fn probe_duration(&self, input: &Path) -> MediaResult<f64>;
}

/// [`MediaSynthesizer`] backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegSynthesizer;

impl FfmpegSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Fail fast if either binary is missing from `PATH`.
    pub fn check(&self) -> MediaResult<()> {
        let ffmpeg = check_ffmpeg()?;
        let ffprobe = check_ffprobe()?;
        info!(
            ffmpeg = %ffmpeg.display(),
            ffprobe = %ffprobe.display(),
            "Media tools available"
        );
        Ok(())
    }
}

#[async_trait]
impl MediaSynthesizer for FfmpegSynthesizer {
    async fn poster(&self, input: &Path, output: &Path) -> MediaResult<()> {
        generate_poster(input, output).await
    }

    async fn storyboard(&self, input: &Path, output_dir: &Path, config: &WebVttConfig) -> MediaResult<()> {
        let out = generate_storyboard(input, output_dir, config).await?;
        info!(
            thumbnails = out.layout.thumbnails,
            "Wrote {} and {}",
            out.sprite.display(),
            out.cues.display()
        );
        Ok(())
    }

    async fn trailer(&self, input: &Path, output: &Path, config: &TrailerConfig) -> MediaResult<()> {
        let clips = generate_trailer(input, output, config).await?;
        info!(clips, "Wrote {}", output.display());
        Ok(())
    }

    async fn probe_duration(&self, input: &Path) -> MediaResult<f64> {
        get_duration(input).await
    }
}
