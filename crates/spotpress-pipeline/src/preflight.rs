//! Print pre-flight: statistical risk scan and contrast auto-fix.
//!
//! The scan is sampled, not exhaustive: it visits every second pixel
//! of the interior on both axes, and its thresholds are fractions of
//! the pixels actually sampled. Results are advisory; nothing here
//! modifies the design except [`auto_contrast_fix`].

use std::collections::HashMap;

use image::RgbaImage;

use crate::color::rgb_distance;
use crate::types::{PreflightReport, Rgb, SpotColor};

/// Alpha above which a pixel counts as printed ink.
const INK_ALPHA: u8 = 50;

/// Distance below which a pixel is considered hard to see on fabric.
const LOW_CONTRAST_DISTANCE: f64 = 40.0;

/// Fraction of sampled pixels that flags the thin-line issue.
const THIN_LINE_FRACTION: f64 = 0.001;

/// Fraction of sampled pixels that flags the low-contrast issue.
const LOW_CONTRAST_FRACTION: f64 = 0.05;

/// Distance below which [`auto_contrast_fix`] shifts a pixel.
const FIX_DISTANCE: f64 = 60.0;

/// Per-channel shift applied by [`auto_contrast_fix`].
const FIX_SHIFT: u8 = 50;

/// Maximum number of spot colors reported.
const MAX_SPOT_COLORS: usize = 8;

/// Scan a composited raster for print risks.
///
/// A pixel with both vertical neighbors transparent counts once
/// toward the thin-line tally, as does one with both horizontal
/// neighbors transparent, so a single-pixel dot contributes twice.
/// The low-contrast tally counts sampled ink pixels within distance
/// 40 of the fabric color. Flags trip when the tallies exceed 0.1%
/// and 5% of all sampled positions, transparent ones included, so a
/// sparse design is judged against the canvas, not against its own
/// coverage.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze(raster: &RgbaImage, fabric: Rgb) -> PreflightReport {
    let (width, height) = raster.dimensions();
    let mut sampled: u64 = 0;
    let mut thin_line_count: u64 = 0;
    let mut low_contrast_count: u64 = 0;

    if width > 2 && height > 2 {
        let mut y = 1;
        while y < height - 1 {
            let mut x = 1;
            while x < width - 1 {
                sampled += 1;
                let pixel = raster.get_pixel(x, y);
                if pixel[3] > INK_ALPHA {
                    let top = raster.get_pixel(x, y - 1)[3];
                    let bottom = raster.get_pixel(x, y + 1)[3];
                    let left = raster.get_pixel(x - 1, y)[3];
                    let right = raster.get_pixel(x + 1, y)[3];
                    if top < INK_ALPHA && bottom < INK_ALPHA {
                        thin_line_count += 1;
                    }
                    if left < INK_ALPHA && right < INK_ALPHA {
                        thin_line_count += 1;
                    }

                    let color = Rgb::new(pixel[0], pixel[1], pixel[2]);
                    if rgb_distance(color, fabric) < LOW_CONTRAST_DISTANCE {
                        low_contrast_count += 1;
                    }
                }
                x += 2;
            }
            y += 2;
        }
    }

    let thin_lines = thin_line_count as f64 > sampled as f64 * THIN_LINE_FRACTION;
    let low_contrast = low_contrast_count as f64 > sampled as f64 * LOW_CONTRAST_FRACTION;

    let mut issues = Vec::new();
    if thin_lines {
        issues.push(String::from(
            "Detected thin lines that may break during screen printing or peeling.",
        ));
    }
    if low_contrast {
        issues.push(format!(
            "Low contrast against rgb({}, {}, {}) fabric. Design may blend in.",
            fabric.r, fabric.g, fabric.b
        ));
    }

    PreflightReport {
        thin_lines,
        low_contrast,
        issues,
        spot_colors: spot_colors(raster),
    }
}

/// Extract dominant colors by sparse sampling and coarse quantization.
///
/// Every tenth pixel with alpha of at least 128 is quantized to the
/// nearest multiple of 32 per channel (capped at 255); the eight most
/// frequent quantized colors are returned, most frequent first, ties
/// broken by channel value for a deterministic order.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn spot_colors(raster: &RgbaImage) -> Vec<SpotColor> {
    let mut counts: HashMap<Rgb, u64> = HashMap::new();
    for pixel in raster.pixels().step_by(10) {
        if pixel[3] < 128 {
            continue;
        }
        let quantize =
            |c: u8| ((f64::from(c) / 32.0).round() * 32.0).min(255.0) as u8;
        let key = Rgb::new(quantize(pixel[0]), quantize(pixel[1]), quantize(pixel[2]));
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<SpotColor> = counts
        .into_iter()
        .map(|(color, frequency)| SpotColor { color, frequency })
        .collect();
    ranked.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| (a.color.r, a.color.g, a.color.b).cmp(&(b.color.r, b.color.g, b.color.b)))
    });
    ranked.truncate(MAX_SPOT_COLORS);
    ranked
}

/// Shift pixels that sit too close to the fabric color.
///
/// Pixels with alpha below 10 are left alone. Opaque pixels within
/// distance 60 of the fabric color move 50 per channel away from the
/// fabric's luminance side: lighter on dark fabric, darker on light
/// fabric. Saturating arithmetic, alpha untouched.
pub fn auto_contrast_fix(raster: &mut RgbaImage, fabric: Rgb) {
    let fabric_luma =
        0.299 * f64::from(fabric.r) + 0.587 * f64::from(fabric.g) + 0.114 * f64::from(fabric.b);
    let dark_fabric = fabric_luma < 128.0;

    for pixel in raster.pixels_mut() {
        if pixel[3] < 10 {
            continue;
        }
        let color = Rgb::new(pixel[0], pixel[1], pixel[2]);
        if rgb_distance(color, fabric) < FIX_DISTANCE {
            for channel in &mut pixel.0[..3] {
                *channel = if dark_fabric {
                    channel.saturating_add(FIX_SHIFT)
                } else {
                    channel.saturating_sub(FIX_SHIFT)
                };
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    const FABRIC: Rgb = Rgb::new(24, 24, 27);

    #[test]
    fn empty_raster_reports_no_issues() {
        let raster = RgbaImage::new(32, 32);
        let report = analyze(&raster, FABRIC);
        assert!(!report.thin_lines);
        assert!(!report.low_contrast);
        assert!(report.issues.is_empty());
        assert!(report.spot_colors.is_empty());
    }

    #[test]
    fn solid_block_has_no_thin_lines() {
        let raster = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
        let report = analyze(&raster, FABRIC);
        assert!(!report.thin_lines);
    }

    #[test]
    fn one_pixel_lines_are_flagged() {
        // Horizontal hairlines on odd rows, so sampled rows hit them.
        let mut raster = RgbaImage::new(64, 64);
        for x in 0..64 {
            for y in [9, 21, 33] {
                raster.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let report = analyze(&raster, FABRIC);
        assert!(report.thin_lines);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn fabric_colored_design_is_low_contrast() {
        let raster = RgbaImage::from_pixel(40, 40, Rgba([30, 30, 33, 255]));
        let report = analyze(&raster, FABRIC);
        assert!(report.low_contrast);
        assert!(report.issues.iter().any(|m| m.contains("Low contrast")));
    }

    #[test]
    fn sparse_fabric_colored_patch_stays_under_threshold() {
        // A 20x20 fabric-colored block on a 100x100 canvas: all of the
        // ink is low contrast, but it covers about 4% of the sampled
        // positions, under the 5% threshold.
        let mut raster = RgbaImage::new(100, 100);
        for y in 40..60 {
            for x in 40..60 {
                raster.put_pixel(x, y, Rgba([30, 30, 33, 255]));
            }
        }
        let report = analyze(&raster, FABRIC);
        assert!(!report.low_contrast);
    }

    #[test]
    fn high_contrast_design_passes() {
        let raster = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
        let report = analyze(&raster, FABRIC);
        assert!(!report.low_contrast);
    }

    #[test]
    fn spot_colors_rank_by_frequency() {
        let mut raster = RgbaImage::from_pixel(100, 10, Rgba([250, 0, 0, 255]));
        for x in 0..100 {
            raster.put_pixel(x, 9, Rgba([0, 250, 0, 255]));
        }
        let colors = spot_colors(&raster);
        assert_eq!(colors[0].color, Rgb::new(255, 0, 0));
        assert!(colors[0].frequency > colors[1].frequency);
        assert_eq!(colors[1].color, Rgb::new(0, 255, 0));
    }

    #[test]
    fn spot_colors_skip_translucent_pixels() {
        let raster = RgbaImage::from_pixel(40, 40, Rgba([200, 0, 0, 100]));
        assert!(spot_colors(&raster).is_empty());
    }

    #[test]
    fn quantization_caps_at_255() {
        let raster = RgbaImage::from_pixel(20, 20, Rgba([250, 250, 250, 255]));
        let colors = spot_colors(&raster);
        assert_eq!(colors[0].color, Rgb::new(255, 255, 255));
    }

    #[test]
    fn auto_fix_lightens_on_dark_fabric() {
        let mut raster = RgbaImage::from_pixel(10, 10, Rgba([30, 30, 33, 255]));
        auto_contrast_fix(&mut raster, FABRIC);
        assert_eq!(*raster.get_pixel(5, 5), Rgba([80, 80, 83, 255]));
    }

    #[test]
    fn auto_fix_darkens_on_light_fabric() {
        let mut raster = RgbaImage::from_pixel(10, 10, Rgba([230, 230, 230, 255]));
        auto_contrast_fix(&mut raster, Rgb::new(240, 240, 240));
        assert_eq!(*raster.get_pixel(5, 5), Rgba([180, 180, 180, 255]));
    }

    #[test]
    fn auto_fix_ignores_distant_and_transparent_pixels() {
        let mut raster = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        raster.put_pixel(0, 0, Rgba([30, 30, 33, 5]));
        auto_contrast_fix(&mut raster, FABRIC);
        assert_eq!(*raster.get_pixel(5, 5), Rgba([255, 0, 0, 255]));
        assert_eq!(*raster.get_pixel(0, 0), Rgba([30, 30, 33, 5]));
    }
}
