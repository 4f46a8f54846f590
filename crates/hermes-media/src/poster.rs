//! Poster frame generation.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::stretch_filter;
use crate::fs_utils::{ensure_parent_dir, verify_output};
use hermes_models::encoding::{POSTER_HEIGHT, POSTER_TIMESTAMP, POSTER_WIDTH};

/// Build the poster command: one frame at the poster timestamp, scaled to
/// the fixed poster resolution.
pub fn poster_command(video_path: impl AsRef<Path>, output_path: impl AsRef<Path>) -> FfmpegCommand {
    FfmpegCommand::new(video_path, output_path)
        .input_arg("-ss")
        .input_arg(POSTER_TIMESTAMP)
        .single_frame()
        .video_filter(stretch_filter(POSTER_WIDTH, POSTER_HEIGHT))
        .log_level("error")
}

/// Generate a poster image from a video file.
pub async fn generate_poster(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let output_path = output_path.as_ref();

    ensure_parent_dir(output_path).await?;

    let cmd = poster_command(video_path, output_path);
    FfmpegRunner::new().run(&cmd).await?;

    verify_output(output_path).await?;
    Ok(())
}
