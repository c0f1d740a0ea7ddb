//! Mask construction and compositing.
//!
//! Two mask conventions live here. A *manual mask* records which
//! pixels the user wants to keep: 255 keeps a pixel, 0 erases it, and
//! merging takes the minimum with the design's own alpha so a mask can
//! only ever remove coverage. A *fill mask* records a selected region
//! for generative fill: 255 is selected, 0 is not.

use image::{GrayImage, Luma, RgbaImage};

use crate::types::PipelineError;

/// Create a manual mask that keeps every pixel.
#[must_use]
pub fn new_manual_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// Create a fill mask with nothing selected.
#[must_use]
pub fn new_fill_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([0]))
}

/// Merge a manual mask into a design's alpha channel in place.
///
/// The resulting alpha of each pixel is `min(alpha, mask)`, so fully
/// transparent pixels stay transparent regardless of the mask value.
///
/// # Errors
///
/// Returns [`PipelineError::MaskDimensionMismatch`] if the mask and
/// design dimensions differ.
pub fn merge_manual_mask(
    design: &mut RgbaImage,
    mask: &GrayImage,
) -> Result<(), PipelineError> {
    check_dimensions(design, mask)?;
    for (pixel, m) in design.pixels_mut().zip(mask.pixels()) {
        pixel[3] = pixel[3].min(m[0]);
    }
    Ok(())
}

/// Stamp a solid circular brush dab onto a mask.
///
/// `value` is 0 to erase (manual mask) or select-nothing (fill mask),
/// 255 to restore or select. `diameter` is the brush size in pixels;
/// pixels within `diameter / 2` of the center are set. Coordinates
/// outside the mask are simply clipped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn paint_dab(mask: &mut GrayImage, cx: f64, cy: f64, diameter: f64, value: u8) {
    let radius = diameter / 2.0;
    if radius <= 0.0 {
        return;
    }
    let (width, height) = mask.dimensions();
    let x_min = ((cx - radius).floor().max(0.0)) as u32;
    let y_min = ((cy - radius).floor().max(0.0)) as u32;
    let x_max = ((cx + radius).ceil().min(f64::from(width) - 1.0)).max(0.0) as u32;
    let y_max = ((cy + radius).ceil().min(f64::from(height) - 1.0)).max(0.0) as u32;
    if cx + radius < 0.0 || cy + radius < 0.0 {
        return;
    }

    for y in y_min..=y_max.min(height.saturating_sub(1)) {
        for x in x_min..=x_max.min(width.saturating_sub(1)) {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            if dx * dx + dy * dy <= radius * radius {
                mask.put_pixel(x, y, Luma([value]));
            }
        }
    }
}

/// Stamp a stroke between two points by interpolating dabs.
///
/// Dabs are spaced at a quarter of the brush diameter so the stroke
/// has no gaps at any speed.
pub fn paint_stroke(
    mask: &mut GrayImage,
    from: (f64, f64),
    to: (f64, f64),
    diameter: f64,
    value: u8,
) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = (dx * dx + dy * dy).sqrt();
    let spacing = (diameter / 4.0).max(1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = (length / spacing).ceil() as u32;
    for i in 0..=steps {
        let t = if steps == 0 {
            0.0
        } else {
            f64::from(i) / f64::from(steps)
        };
        paint_dab(mask, from.0 + dx * t, from.1 + dy * t, diameter, value);
    }
}

/// Reset every pixel of a mask to `value`.
pub fn clear(mask: &mut GrayImage, value: u8) {
    for pixel in mask.pixels_mut() {
        pixel[0] = value;
    }
}

/// Punch the selected region out of a design (destination-out).
///
/// Each output alpha is `alpha * (255 - mask) / 255`, leaving a
/// transparent hole where the mask selects.
///
/// # Errors
///
/// Returns [`PipelineError::MaskDimensionMismatch`] if the mask and
/// design dimensions differ.
pub fn cut_out_region(
    design: &RgbaImage,
    mask: &GrayImage,
) -> Result<RgbaImage, PipelineError> {
    check_dimensions(design, mask)?;
    let mut out = design.clone();
    for (pixel, m) in out.pixels_mut().zip(mask.pixels()) {
        pixel[3] = scale_alpha(pixel[3], 255 - m[0]);
    }
    Ok(out)
}

/// Keep only the selected region of a patch (destination-in).
///
/// Each output alpha is `alpha * mask / 255`, so the patch is
/// trimmed to the selection before it is composited back.
///
/// # Errors
///
/// Returns [`PipelineError::MaskDimensionMismatch`] if the mask and
/// patch dimensions differ.
pub fn extract_patch(
    patch: &RgbaImage,
    mask: &GrayImage,
) -> Result<RgbaImage, PipelineError> {
    check_dimensions(patch, mask)?;
    let mut out = patch.clone();
    for (pixel, m) in out.pixels_mut().zip(mask.pixels()) {
        pixel[3] = scale_alpha(pixel[3], m[0]);
    }
    Ok(out)
}

#[allow(clippy::cast_possible_truncation)]
fn scale_alpha(alpha: u8, factor: u8) -> u8 {
    ((u16::from(alpha) * u16::from(factor) + 127) / 255) as u8
}

fn check_dimensions(design: &RgbaImage, mask: &GrayImage) -> Result<(), PipelineError> {
    if design.dimensions() == mask.dimensions() {
        Ok(())
    } else {
        let (mask_width, mask_height) = mask.dimensions();
        let (width, height) = design.dimensions();
        Err(PipelineError::MaskDimensionMismatch {
            mask_width,
            mask_height,
            width,
            height,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn merge_takes_minimum_alpha() {
        let mut design = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 200]));
        design.put_pixel(1, 1, Rgba([10, 20, 30, 50]));
        let mut mask = new_manual_mask(4, 4);
        mask.put_pixel(0, 0, Luma([100]));
        mask.put_pixel(1, 1, Luma([100]));

        merge_manual_mask(&mut design, &mask).unwrap();
        assert_eq!(design.get_pixel(0, 0)[3], 100);
        assert_eq!(design.get_pixel(1, 1)[3], 50, "mask can only remove");
        assert_eq!(design.get_pixel(2, 2)[3], 200);
    }

    #[test]
    fn merge_rejects_mismatched_dimensions() {
        let mut design = RgbaImage::new(4, 4);
        let mask = new_manual_mask(5, 4);
        let err = merge_manual_mask(&mut design, &mask).unwrap_err();
        assert!(matches!(err, PipelineError::MaskDimensionMismatch { .. }));
    }

    #[test]
    fn dab_paints_a_disc() {
        let mut mask = new_manual_mask(21, 21);
        paint_dab(&mut mask, 10.0, 10.0, 10.0, 0);
        assert_eq!(mask.get_pixel(10, 10)[0], 0);
        assert_eq!(mask.get_pixel(10, 6)[0], 0, "inside radius 5");
        assert_eq!(mask.get_pixel(10, 16)[0], 255, "outside radius 5");
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn dab_clips_at_the_border() {
        let mut mask = new_fill_mask(10, 10);
        paint_dab(&mut mask, 0.0, 0.0, 8.0, 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(9, 9)[0], 0);
    }

    #[test]
    fn stroke_leaves_no_gaps() {
        let mut mask = new_manual_mask(40, 20);
        paint_stroke(&mut mask, (5.0, 10.0), (35.0, 10.0), 6.0, 0);
        for x in 5..=35 {
            assert_eq!(mask.get_pixel(x, 10)[0], 0, "gap at x={x}");
        }
    }

    #[test]
    fn cut_out_then_extract_partition_alpha() {
        let design = RgbaImage::from_pixel(6, 6, Rgba([50, 60, 70, 255]));
        let mut mask = new_fill_mask(6, 6);
        paint_dab(&mut mask, 3.0, 3.0, 4.0, 255);

        let hole = cut_out_region(&design, &mask).unwrap();
        let patch = extract_patch(&design, &mask).unwrap();
        assert_eq!(hole.get_pixel(3, 3)[3], 0);
        assert_eq!(patch.get_pixel(3, 3)[3], 255);
        assert_eq!(hole.get_pixel(0, 0)[3], 255);
        assert_eq!(patch.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn clear_resets_every_pixel() {
        let mut mask = new_manual_mask(8, 8);
        paint_dab(&mut mask, 4.0, 4.0, 6.0, 0);
        clear(&mut mask, 255);
        assert!(mask.pixels().all(|p| p[0] == 255));
    }
}
