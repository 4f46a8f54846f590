//! Trailer synthesis: short clips sampled across the source, re-encoded to a
//! common geometry and concatenated.

use rand::Rng;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use hermes_models::encoding::{DEFAULT_AUDIO_CODEC, DEFAULT_VIDEO_CODEC};
use hermes_models::{SelectionStrategy, TrailerConfig, MAX_TRAILER_CLIP_COUNT};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::trailer_scale_filter;
use crate::fs_utils::{ensure_parent_dir, verify_output};
use crate::probe::probe_video;

const CLIP_DIR_PREFIX: &str = "trailer_clips_";
const CONCAT_LIST: &str = "concat.txt";

/// Choose clip start offsets in seconds, in chronological order.
///
/// `Uniform` spaces `count` offsets `duration / count` apart and drops any
/// whose clip would run past the end. `Random` draws up to `count` offsets
/// from `[0, duration - clip_duration]` and yields none if the source is
/// shorter than one clip. `count` is clamped to [`MAX_TRAILER_CLIP_COUNT`].
pub fn select_clip_starts<R: Rng>(
    strategy: SelectionStrategy,
    count: u32,
    clip_duration: f64,
    duration: f64,
    rng: &mut R,
) -> Vec<f64> {
    let count = count.min(MAX_TRAILER_CLIP_COUNT);
    match strategy {
        SelectionStrategy::Uniform => {
            let step = duration / count as f64;
            // Starts increase, so the first clip past the end ends the run.
            (0..count)
                .map(|i| i as f64 * step)
                .take_while(|start| start + clip_duration <= duration)
                .collect()
        }
        SelectionStrategy::Random => {
            let max_start = duration - clip_duration;
            if max_start < 0.0 {
                return Vec::new();
            }
            let mut starts: Vec<f64> = (0..count)
                .map(|_| rng.random::<f64>() * max_start)
                .collect();
            starts.sort_by(|a, b| a.total_cmp(b));
            starts
        }
    }
}

/// ffconcat list for local clip files.
fn concat_list(clips: &[PathBuf]) -> String {
    let mut list = String::new();
    for clip in clips {
        let path = clip.to_string_lossy().replace('\'', r"'\''");
        let _ = writeln!(list, "file '{}'", path);
    }
    list
}

/// Generate a trailer at `output_path`.
///
/// Clips are staged in a private temporary directory that is removed when
/// this function returns, whether or not it succeeded. Returns the number
/// of clips used.
pub async fn generate_trailer(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &TrailerConfig,
) -> MediaResult<usize> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    let source = probe_video(video_path).await?;
    let filter = trailer_scale_filter(config, &source);

    let starts = {
        let mut rng = rand::rng();
        select_clip_starts(
            config.selection_strategy,
            config.clip_count,
            config.clip_duration,
            source.duration,
            &mut rng,
        )
    };

    if starts.is_empty() {
        return Err(MediaError::invalid_video(format!(
            "source of {:.3}s is too short for a {:.3}s clip",
            source.duration, config.clip_duration
        )));
    }

    debug!(
        clips = starts.len(),
        filter = %filter,
        "Extracting trailer clips from {}",
        video_path.display()
    );

    let staging = tokio::task::spawn_blocking(|| {
        tempfile::Builder::new().prefix(CLIP_DIR_PREFIX).tempdir()
    })
    .await
    .map_err(std::io::Error::other)??;

    let runner = FfmpegRunner::new();
    let mut clips = Vec::with_capacity(starts.len());

    for (i, start) in starts.iter().enumerate() {
        let clip_path = staging.path().join(format!("clip_{}.mp4", i));

        let cmd = FfmpegCommand::new(video_path, &clip_path)
            .seek(*start)
            .duration(config.clip_duration)
            .video_filter(&filter)
            .video_codec(DEFAULT_VIDEO_CODEC)
            .audio_codec(DEFAULT_AUDIO_CODEC);

        if let Err(e) = runner.run(&cmd).await {
            warn!("Failed to extract trailer clip {} at {:.3}s: {}", i, start, e);
            return Err(e);
        }
        clips.push(clip_path);
    }

    let list_path = staging.path().join(CONCAT_LIST);
    tokio::fs::write(&list_path, concat_list(&clips)).await?;

    ensure_parent_dir(output_path).await?;
    let concat = FfmpegCommand::new(&list_path, output_path)
        .concat_input()
        .stream_copy();
    runner.run(&concat).await?;

    verify_output(output_path).await?;
    Ok(clips.len())
}
