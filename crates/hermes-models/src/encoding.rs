//! Encoding parameters and artifact names.

/// Codec used when re-encoding trailer clips
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Audio codec used when re-encoding trailer clips
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Poster frame settings
pub const POSTER_TIMESTAMP: &str = "00:00:01";
pub const POSTER_WIDTH: u32 = 1280;
pub const POSTER_HEIGHT: u32 = 720;

/// Artifact file names, relative to a task's output directory
pub const POSTER_FILE: &str = "poster.jpg";
pub const STORYBOARD_FILE: &str = "storyboard.jpg";
pub const CUE_FILE: &str = "thumbnails.vtt";
pub const TRAILER_FILE: &str = "trailer.mp4";

/// Public URL prefix that cue files use to reference the sprite sheet
pub const UPLOADS_URL_PREFIX: &str = "/uploads";
