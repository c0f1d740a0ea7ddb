//! Color-based segmentation: background removal and selective recolor.
//!
//! Classification is per-pixel against the targets in a
//! [`RecolorConfig`], using Euclidean RGB distance with inclusive
//! tolerances. Removal wins over recoloring: a pixel matched by a
//! removal target is made transparent and never recolored.

use image::RgbaImage;

use crate::color::{hsl_to_rgb, rgb_distance, rgb_to_hsl};
use crate::types::{RecolorConfig, Rgb};

/// Width of the border band that gets a relaxed second removal pass.
const EDGE_MARGIN: u32 = 5;

/// Tolerance multiplier applied inside the border band.
const EDGE_TOLERANCE_FACTOR: f64 = 1.5;

/// Distance threshold for the corner background heuristic.
const CORNER_MATCH_DISTANCE: f64 = 15.0;

/// Apply removal and selective recoloring to a raster.
///
/// Each pixel is tested against `config.remove_targets` in order, and
/// made fully transparent on the first match within
/// `config.remove_tolerance` (inclusive). Pixels in the outer
/// 5-pixel border are retested with the tolerance relaxed by 1.5x so
/// anti-aliased background remnants do not survive as a halo. When any
/// removal target is configured, the outermost 1-pixel ring is cleared
/// unconditionally; this also drops edge pixels the user may have
/// wanted opaque, which is accepted to keep cut-out edges seam free.
///
/// Surviving pixels within `config.edit_tolerance` of
/// `config.edit_target` are shifted in HSL: hue by `hue_shift`
/// (wrapping), saturation by `sat_shift` (clamped to [0, 100]),
/// lightness untouched. Alpha is preserved except for removal, and
/// already-transparent pixels are skipped entirely.
#[must_use]
pub fn remove_and_recolor(src: &RgbaImage, config: &RecolorConfig) -> RgbaImage {
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    let removing = !config.remove_targets.is_empty();

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if pixel[3] == 0 {
            continue;
        }
        let color = Rgb::new(pixel[0], pixel[1], pixel[2]);

        if removing {
            let on_ring =
                x == 0 || y == 0 || x + 1 == width || y + 1 == height;
            if on_ring {
                pixel[3] = 0;
                continue;
            }

            let in_border = x < EDGE_MARGIN
                || y < EDGE_MARGIN
                || x + EDGE_MARGIN >= width
                || y + EDGE_MARGIN >= height;
            let tolerance = if in_border {
                config.remove_tolerance * EDGE_TOLERANCE_FACTOR
            } else {
                config.remove_tolerance
            };
            if config
                .remove_targets
                .iter()
                .any(|target| rgb_distance(color, *target) <= tolerance)
            {
                pixel[3] = 0;
                continue;
            }
        }

        if let Some(target) = config.edit_target
            && rgb_distance(color, target) <= config.edit_tolerance
        {
            let mut hsl = rgb_to_hsl(color);
            hsl.h = (hsl.h + config.hue_shift).rem_euclid(360.0);
            hsl.s = (hsl.s + config.sat_shift).clamp(0.0, 100.0);
            let shifted = hsl_to_rgb(hsl);
            pixel[0] = shifted.r;
            pixel[1] = shifted.g;
            pixel[2] = shifted.b;
        }
    }

    out
}

/// Guess the background color from the image corners.
///
/// Samples all four corner pixels; if at least three of them lie
/// within distance 15 of the top-left corner's color, that color is
/// considered the background. Returns `None` for empty images or when
/// the corners disagree.
#[must_use]
pub fn detect_background(src: &RgbaImage) -> Option<Rgb> {
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let sample = |x: u32, y: u32| {
        let p = src.get_pixel(x, y);
        Rgb::new(p[0], p[1], p[2])
    };
    let reference = sample(0, 0);
    let corners = [
        reference,
        sample(width - 1, 0),
        sample(0, height - 1),
        sample(width - 1, height - 1),
    ];

    let matching = corners
        .iter()
        .filter(|corner| rgb_distance(**corner, reference) <= CORNER_MATCH_DISTANCE)
        .count();
    (matching >= 3).then_some(reference)
}
