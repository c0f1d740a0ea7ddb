//! spotpress-export: print presets and raster export encoding
//! (sans-IO).
//!
//! Sizing resolves a requested output (a resolution multiplier or a
//! physical print preset) to pixel dimensions; the design is then fit
//! onto a transparent canvas of exactly those dimensions, aspect
//! preserved and centered, and encoded.

pub mod preset;

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage, imageops};
use spotpress_pipeline::{Dimensions, Rgb};

pub use preset::{PrintPreset, find_preset, print_presets};

/// Errors from export sizing and encoding.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The multiplier was zero, negative, or not finite.
    #[error("export multiplier must be positive and finite, got {0}")]
    InvalidMultiplier(f64),

    /// No preset exists with the requested identifier.
    #[error("unknown print preset {0:?}")]
    UnknownPreset(String),

    /// The source raster has a zero dimension.
    #[error("cannot export a raster with dimension {width}x{height}")]
    ZeroDimensions {
        /// Source width.
        width: u32,
        /// Source height.
        height: u32,
    },

    /// The encoder failed.
    #[error("failed to encode export: {0}")]
    Encode(#[from] image::ImageError),
}

/// Requested export sizing.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportSize {
    /// Scale the source dimensions by a factor.
    Multiplier(f64),
    /// Use a physical print preset's pixel dimensions.
    Preset(String),
}

/// Resolve an [`ExportSize`] against the source dimensions.
///
/// # Errors
///
/// Returns [`ExportError::InvalidMultiplier`] for non-positive or
/// non-finite multipliers and [`ExportError::UnknownPreset`] for an
/// unrecognized preset id.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn export_dimensions(
    source: Dimensions,
    size: &ExportSize,
) -> Result<Dimensions, ExportError> {
    match size {
        ExportSize::Multiplier(factor) => {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(ExportError::InvalidMultiplier(*factor));
            }
            Ok(Dimensions {
                width: ((f64::from(source.width) * factor).round().max(1.0)) as u32,
                height: ((f64::from(source.height) * factor).round().max(1.0)) as u32,
            })
        }
        ExportSize::Preset(id) => {
            let preset =
                find_preset(id).ok_or_else(|| ExportError::UnknownPreset(id.clone()))?;
            Ok(Dimensions {
                width: preset.pixel_width(),
                height: preset.pixel_height(),
            })
        }
    }
}

/// Fit a design onto a transparent canvas of exactly the target
/// dimensions, aspect preserved and centered.
///
/// # Errors
///
/// Returns [`ExportError::ZeroDimensions`] if the design or target
/// has a zero dimension.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_for_export(
    design: &RgbaImage,
    target: Dimensions,
) -> Result<RgbaImage, ExportError> {
    let (src_width, src_height) = design.dimensions();
    if src_width == 0 || src_height == 0 {
        return Err(ExportError::ZeroDimensions {
            width: src_width,
            height: src_height,
        });
    }
    if target.width == 0 || target.height == 0 {
        return Err(ExportError::ZeroDimensions {
            width: target.width,
            height: target.height,
        });
    }

    let scale = (f64::from(target.width) / f64::from(src_width))
        .min(f64::from(target.height) / f64::from(src_height));
    let fitted_width = ((f64::from(src_width) * scale).round().max(1.0)) as u32;
    let fitted_height = ((f64::from(src_height) * scale).round().max(1.0)) as u32;

    let fitted = imageops::resize(
        design,
        fitted_width,
        fitted_height,
        imageops::FilterType::Lanczos3,
    );
    let mut canvas = RgbaImage::new(target.width, target.height);
    imageops::overlay(
        &mut canvas,
        &fitted,
        i64::from((target.width - fitted_width) / 2),
        i64::from((target.height - fitted_height) / 2),
    );
    Ok(canvas)
}

/// Encode a raster as PNG bytes, preserving transparency.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Cursor::new(Vec::new());
    raster.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Encode a raster as JPEG bytes, flattened onto a background color
/// since JPEG has no alpha channel.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_jpeg(raster: &RgbaImage, background: Rgb) -> Result<Vec<u8>, ExportError> {
    let (width, height) = raster.dimensions();
    let mut flat = RgbaImage::from_pixel(
        width,
        height,
        Rgba([background.r, background.g, background.b, 255]),
    );
    imageops::overlay(&mut flat, raster, 0, 0);

    let rgb = image::DynamicImage::ImageRgba8(flat).to_rgb8();
    let mut bytes = Cursor::new(Vec::new());
    rgb.write_to(&mut bytes, ImageFormat::Jpeg)?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_scales_dimensions() {
        let dims = export_dimensions(
            Dimensions {
                width: 100,
                height: 80,
            },
            &ExportSize::Multiplier(2.5),
        )
        .unwrap();
        assert_eq!((dims.width, dims.height), (250, 200));
    }

    #[test]
    fn non_positive_multiplier_rejected() {
        let source = Dimensions {
            width: 10,
            height: 10,
        };
        assert!(export_dimensions(source, &ExportSize::Multiplier(0.0)).is_err());
        assert!(export_dimensions(source, &ExportSize::Multiplier(-1.0)).is_err());
        assert!(export_dimensions(source, &ExportSize::Multiplier(f64::NAN)).is_err());
    }

    #[test]
    fn preset_dimensions_ignore_source() {
        let dims = export_dimensions(
            Dimensions {
                width: 10,
                height: 10,
            },
            &ExportSize::Preset(String::from("standard")),
        )
        .unwrap();
        assert_eq!((dims.width, dims.height), (3600, 4800));
    }

    #[test]
    fn unknown_preset_rejected() {
        let err = export_dimensions(
            Dimensions {
                width: 10,
                height: 10,
            },
            &ExportSize::Preset(String::from("mural")),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::UnknownPreset(_)));
    }

    #[test]
    fn fit_centers_a_wide_design_on_a_tall_canvas() {
        let design = RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255]));
        let out = fit_for_export(
            &design,
            Dimensions {
                width: 100,
                height: 100,
            },
        )
        .unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(50, 50)[3], 255, "center is covered");
        assert_eq!(out.get_pixel(50, 10)[3], 0, "top band is transparent");
        assert_eq!(out.get_pixel(50, 90)[3], 0, "bottom band is transparent");
    }

    #[test]
    fn png_round_trip_preserves_pixels() {
        let design = RgbaImage::from_pixel(9, 4, Rgba([1, 2, 3, 200]));
        let bytes = encode_png(&design).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, design);
    }

    #[test]
    fn jpeg_flattens_transparency_onto_background() {
        let mut design = RgbaImage::new(8, 8);
        design.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        let bytes = encode_jpeg(&design, Rgb::new(24, 24, 27)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        // Transparent area takes the fabric color (JPEG is lossy, so
        // allow a small tolerance).
        let p = decoded.get_pixel(6, 6);
        assert!(i16::from(p[0]).abs_diff(24) < 12, "got {p:?}");
    }
}
