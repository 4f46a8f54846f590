//! FFmpeg video filter builders.

use hermes_models::{AspectRatioStrategy, TrailerConfig};

use crate::probe::VideoInfo;

/// Scale preserving aspect ratio, then pad to exactly `width`x`height`.
pub fn fit_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    )
}

/// Scale preserving aspect ratio until the box is covered, then crop to it.
pub fn crop_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = width,
        h = height
    )
}

/// Scale straight to the box.
pub fn stretch_filter(width: u32, height: u32) -> String {
    format!("scale={}:{}", width, height)
}

/// Filter for an aspect ratio strategy and target box.
pub fn scale_filter(strategy: AspectRatioStrategy, width: u32, height: u32) -> String {
    match strategy {
        AspectRatioStrategy::Fit => fit_filter(width, height),
        AspectRatioStrategy::Crop => crop_filter(width, height),
        AspectRatioStrategy::Stretch => stretch_filter(width, height),
    }
}

/// Largest box with the source's aspect ratio that fits in `max_width`x`max_height`.
///
/// Height-constrained when the scaled width fits, width-constrained
/// otherwise. Both sides are rounded down to even values for 4:2:0 encoders.
pub fn fit_box(source_width: u32, source_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let aspect = source_width as f64 / source_height as f64;

    let height_constrained_width = (max_height as f64 * aspect) as u32;
    let (width, height) = if height_constrained_width <= max_width {
        (height_constrained_width, max_height)
    } else {
        (max_width, (max_width as f64 / aspect) as u32)
    };

    (even(width), even(height))
}

fn even(value: u32) -> u32 {
    (value & !1).max(2)
}

/// Scale filter for trailer clips.
///
/// Portrait sources under `fit` get a target box recomputed from the max box
/// so they are not pillarboxed into a landscape frame.
pub fn trailer_scale_filter(config: &TrailerConfig, source: &VideoInfo) -> String {
    let (width, height) =
        if source.is_portrait() && config.aspect_ratio_strategy == AspectRatioStrategy::Fit {
            fit_box(source.width, source.height, config.max_width, config.max_height)
        } else {
            (config.width, config.height)
        };

    scale_filter(config.aspect_ratio_strategy, width, height)
}

/// Sample one frame per `interval` seconds, fit each into a cell and tile
/// them `columns`x`rows` into a single image.
pub fn storyboard_filter(interval: f64, cell_width: u32, cell_height: u32, columns: u32, rows: u32) -> String {
    format!(
        "fps=1/{},{},tile={}x{}",
        interval,
        fit_filter(cell_width, cell_height),
        columns,
        rows
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(width: u32, height: u32) -> VideoInfo {
        VideoInfo {
            duration: 60.0,
            width,
            height,
        }
    }

    #[test]
    fn test_strategy_filters() {
        assert_eq!(
            scale_filter(AspectRatioStrategy::Fit, 1280, 720),
            "scale=1280:720:force_original_aspect_ratio=decrease,pad=1280:720:(ow-iw)/2:(oh-ih)/2"
        );
        assert_eq!(
            scale_filter(AspectRatioStrategy::Crop, 1280, 720),
            "scale=1280:720:force_original_aspect_ratio=increase,crop=1280:720"
        );
        assert_eq!(
            scale_filter(AspectRatioStrategy::Stretch, 1280, 720),
            "scale=1280:720"
        );
    }

    #[test]
    fn test_fit_box_height_constrained() {
        // 9:16 source into a square max box
        assert_eq!(fit_box(1080, 1920, 1280, 1280), (720, 1280));
    }

    #[test]
    fn test_fit_box_width_constrained() {
        // 9:16 source into a very short, narrow box
        assert_eq!(fit_box(1080, 1920, 300, 1280), (300, 532));
    }

    #[test]
    fn test_fit_box_rounds_to_even() {
        // 720 * 0.5625 = 405
        assert_eq!(fit_box(1080, 1920, 1280, 720), (404, 720));
    }

    #[test]
    fn test_trailer_filter_landscape_uses_configured_box() {
        let config = TrailerConfig::default();
        assert_eq!(
            trailer_scale_filter(&config, &info(1920, 1080)),
            fit_filter(1280, 720)
        );
    }

    #[test]
    fn test_trailer_filter_portrait_fit_uses_max_box() {
        let config = TrailerConfig {
            max_width: 1280,
            max_height: 1280,
            ..TrailerConfig::default()
        };
        assert_eq!(
            trailer_scale_filter(&config, &info(1080, 1920)),
            fit_filter(720, 1280)
        );
    }

    #[test]
    fn test_trailer_filter_portrait_crop_ignores_max_box() {
        let config = TrailerConfig {
            aspect_ratio_strategy: AspectRatioStrategy::Crop,
            max_width: 1280,
            max_height: 1280,
            ..TrailerConfig::default()
        };
        assert_eq!(
            trailer_scale_filter(&config, &info(1080, 1920)),
            crop_filter(1280, 720)
        );
    }

    #[test]
    fn test_storyboard_filter() {
        assert_eq!(
            storyboard_filter(10.0, 160, 90, 5, 3),
            "fps=1/10,scale=160:90:force_original_aspect_ratio=decrease,pad=160:90:(ow-iw)/2:(oh-ih)/2,tile=5x3"
        );
        assert!(storyboard_filter(2.5, 90, 160, 4, 1).starts_with("fps=1/2.5,"));
    }
}
