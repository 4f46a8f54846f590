//! Storyboard sprite sheet and WebVTT cue file generation.
//!
//! One ffmpeg pass samples a frame every `interval` seconds and tiles them
//! into `storyboard.jpg`. The cue file then maps each interval to the
//! rectangle of its tile, so players can show hover previews from a
//! single image.

use std::path::{Path, PathBuf};
use tracing::debug;

use hermes_models::encoding::{CUE_FILE, STORYBOARD_FILE, UPLOADS_URL_PREFIX};
use hermes_models::WebVttConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::storyboard_filter;
use crate::fs_utils::{ensure_dir, verify_output};
use crate::probe::{probe_video, VideoInfo};

/// Geometry and timing of a storyboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoryboardLayout {
    /// Covered duration, after clamping to `maxDuration`
    pub duration: f64,
    pub interval: f64,
    pub columns: u32,
    pub rows: u32,
    pub thumbnails: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl StoryboardLayout {
    /// Compute the layout for a source.
    ///
    /// Portrait sources swap the configured cell width and height.
    pub fn new(config: &WebVttConfig, source: &VideoInfo) -> MediaResult<Self> {
        let mut duration = source.duration;
        if config.max_duration > 0.0 && duration > config.max_duration {
            duration = config.max_duration;
        }

        if !(duration > 0.0) {
            return Err(MediaError::invalid_video(format!(
                "cannot build storyboard for duration {}",
                duration
            )));
        }

        let thumbnails = (duration / config.interval).ceil() as u32;
        let rows = thumbnails.div_ceil(config.num_columns);

        let (cell_width, cell_height) = if source.is_portrait() {
            (config.height, config.width)
        } else {
            (config.width, config.height)
        };

        Ok(Self {
            duration,
            interval: config.interval,
            columns: config.num_columns,
            rows,
            thumbnails,
            cell_width,
            cell_height,
        })
    }

    /// Top-left pixel of the tile for thumbnail `index`.
    pub fn tile_origin(&self, index: u32) -> (u32, u32) {
        let row = index / self.columns;
        let col = index % self.columns;
        (col * self.cell_width, row * self.cell_height)
    }

    /// The ffmpeg filter producing the sprite sheet.
    pub fn filter(&self) -> String {
        storyboard_filter(
            self.interval,
            self.cell_width,
            self.cell_height,
            self.columns,
            self.rows,
        )
    }

    /// Render the cue file referencing `sprite_url`.
    pub fn cue_file(&self, sprite_url: &str) -> String {
        let mut lines = vec!["WEBVTT".to_string(), String::new()];

        for i in 0..self.thumbnails {
            let start = i as f64 * self.interval;
            let end = ((i + 1) as f64 * self.interval).min(self.duration);
            let (x, y) = self.tile_origin(i);

            lines.push(format!("{} --> {}", format_cue_time(start), format_cue_time(end)));
            lines.push(format!(
                "{}#xywh={},{},{},{}",
                sprite_url, x, y, self.cell_width, self.cell_height
            ));
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

/// Format seconds as `HH:MM:SS.mmm`.
///
/// Rounds to whole milliseconds before splitting, so the seconds field
/// stays below 60.
pub fn format_cue_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let h = total_ms / 3_600_000;
    let m = total_ms / 60_000 % 60;
    let s = total_ms / 1000 % 60;
    let ms = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

/// Files written by [`generate_storyboard`].
#[derive(Debug, Clone)]
pub struct StoryboardOutput {
    pub sprite: PathBuf,
    pub cues: PathBuf,
    pub layout: StoryboardLayout,
}

/// Public URL of the sprite sheet for an output directory.
pub fn sprite_url(output_dir: &Path) -> String {
    let base = output_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}/{}/{}", UPLOADS_URL_PREFIX, base, STORYBOARD_FILE)
}

/// Generate `storyboard.jpg` and `thumbnails.vtt` in `output_dir`.
pub async fn generate_storyboard(
    video_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &WebVttConfig,
) -> MediaResult<StoryboardOutput> {
    let video_path = video_path.as_ref();
    let output_dir = output_dir.as_ref();

    let source = probe_video(video_path).await?;
    let layout = StoryboardLayout::new(config, &source)?;
    debug!(
        thumbnails = layout.thumbnails,
        rows = layout.rows,
        cell_width = layout.cell_width,
        cell_height = layout.cell_height,
        "Storyboard layout for {}",
        video_path.display()
    );

    ensure_dir(output_dir).await?;

    let sprite = output_dir.join(STORYBOARD_FILE);
    let cmd = FfmpegCommand::new(video_path, &sprite)
        .video_filter(layout.filter())
        .frames(1);
    FfmpegRunner::new().run(&cmd).await?;
    verify_output(&sprite).await?;

    let cues = output_dir.join(CUE_FILE);
    tokio::fs::write(&cues, layout.cue_file(&sprite_url(output_dir))).await?;
    verify_output(&cues).await?;

    Ok(StoryboardOutput {
        sprite,
        cues,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landscape(duration: f64) -> VideoInfo {
        VideoInfo {
            duration,
            width: 1920,
            height: 1080,
        }
    }

    fn config(interval: f64, num_columns: u32) -> WebVttConfig {
        WebVttConfig {
            interval,
            num_columns,
            ..WebVttConfig::default()
        }
    }

    #[test]
    fn test_format_cue_time() {
        assert_eq!(format_cue_time(125.25), "00:02:05.250");
        assert_eq!(format_cue_time(0.0), "00:00:00.000");
        assert_eq!(format_cue_time(3725.5), "01:02:05.500");
    }

    #[test]
    fn test_format_cue_time_carries_rounded_seconds() {
        assert_eq!(format_cue_time(59.9996), "00:01:00.000");
        assert_eq!(format_cue_time(5400.0 * 0.7), "01:03:00.000");

        for interval in [0.1, 0.3, 0.7, 1.1, 2.3] {
            for i in 0..20_000u32 {
                let stamp = format_cue_time(i as f64 * interval);
                let seconds: f64 = stamp[6..].parse().unwrap();
                assert!(seconds < 60.0, "{} at {} x {}", stamp, i, interval);
            }
        }
    }

    #[test]
    fn test_layout_counts() {
        let layout = StoryboardLayout::new(&config(1.0, 5), &landscape(12.0)).unwrap();
        assert_eq!(layout.thumbnails, 12);
        assert_eq!(layout.rows, 3);
    }

    #[test]
    fn test_cue_blocks() {
        let layout = StoryboardLayout::new(&config(1.0, 5), &landscape(12.0)).unwrap();
        let vtt = layout.cue_file("/uploads/42/storyboard.jpg");

        assert!(vtt.starts_with("WEBVTT\n\n"));
        let blocks: Vec<&str> = vtt.lines().filter(|l| l.contains("-->")).collect();
        assert_eq!(blocks.len(), 12);

        // Block 6 sits at row 1, col 1
        assert_eq!(layout.tile_origin(6), (160, 90));
        assert!(vtt.contains(
            "00:00:06.000 --> 00:00:07.000\n/uploads/42/storyboard.jpg#xywh=160,90,160,90\n"
        ));
    }

    #[test]
    fn test_last_cue_ends_at_duration() {
        let layout = StoryboardLayout::new(&config(10.0, 5), &landscape(25.0)).unwrap();
        assert_eq!(layout.thumbnails, 3);

        let vtt = layout.cue_file("/uploads/1/storyboard.jpg");
        assert!(vtt.contains("00:00:20.000 --> 00:00:25.000"));
    }

    #[test]
    fn test_max_duration_clamps() {
        let cfg = WebVttConfig {
            max_duration: 60.0,
            ..config(10.0, 5)
        };
        let layout = StoryboardLayout::new(&cfg, &landscape(7200.0)).unwrap();
        assert_eq!(layout.duration, 60.0);
        assert_eq!(layout.thumbnails, 6);
        assert_eq!(layout.rows, 2);

        // Zero means unbounded
        let cfg = WebVttConfig {
            max_duration: 0.0,
            ..config(10.0, 5)
        };
        let layout = StoryboardLayout::new(&cfg, &landscape(7200.0)).unwrap();
        assert_eq!(layout.thumbnails, 720);
    }

    #[test]
    fn test_portrait_swaps_cell() {
        let portrait = VideoInfo {
            duration: 30.0,
            width: 1080,
            height: 1920,
        };
        let layout = StoryboardLayout::new(&WebVttConfig::default(), &portrait).unwrap();
        assert_eq!((layout.cell_width, layout.cell_height), (90, 160));
        assert!(layout.filter().contains("scale=90:160"));
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert!(StoryboardLayout::new(&WebVttConfig::default(), &landscape(0.0)).is_err());
    }

    #[test]
    fn test_sprite_url_uses_output_basename() {
        assert_eq!(
            sprite_url(Path::new("/data/uploads/videos/42")),
            "/uploads/42/storyboard.jpg"
        );
    }
}
