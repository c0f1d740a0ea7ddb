//! Repeating-pattern synthesis: grid, brick and half-drop tilings
//! with arbitrary rotation and gap-free coverage.
//!
//! The tiler assembles an oversized tile field, rotates the whole
//! field about its center, and crops the target canvas out of the
//! middle. The field extends at least 1.5x the canvas diagonal in
//! both axes so no rotation angle can expose an uncovered corner. The
//! field-to-canvas margin is a whole number of tiles, so at zero
//! rotation visible tile corners land on exact multiples of the tile
//! size in canvas coordinates.

use image::{Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

use crate::types::{Dimensions, PatternKind, PatternSpec, PipelineError};

/// Top-left positions for every tile in a field, in field coordinates.
///
/// Placements start one tile before the origin on each axis so the
/// half-tile offsets of brick and half-drop layouts cannot leave a
/// gap along the field edges.
#[must_use]
pub fn tile_placements(
    kind: PatternKind,
    tile_width: i64,
    tile_height: i64,
    field_width: i64,
    field_height: i64,
) -> Vec<(i64, i64)> {
    if tile_width <= 0 || tile_height <= 0 {
        return Vec::new();
    }
    let cols = field_width / tile_width + 1;
    let rows = field_height / tile_height + 1;

    let mut placements = Vec::new();
    for row in -1..=rows {
        for col in -1..=cols {
            let mut x = col * tile_width;
            let mut y = row * tile_height;
            match kind {
                PatternKind::Grid => {}
                PatternKind::Brick => {
                    if row.rem_euclid(2) == 1 {
                        x += tile_width / 2;
                    }
                }
                PatternKind::HalfDrop => {
                    if col.rem_euclid(2) == 1 {
                        y += tile_height / 2;
                    }
                }
            }
            placements.push((x, y));
        }
    }
    placements
}

/// Tile a design raster across a target canvas.
///
/// Tile width is `density%` of the target width; tile height
/// preserves the design's aspect ratio. The output always has exactly
/// the target dimensions and full coverage for any rotation.
///
/// # Errors
///
/// Returns [`PipelineError::ZeroDimensions`] if the design or the
/// target has a zero dimension.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn tile_pattern(
    design: &RgbaImage,
    spec: &PatternSpec,
    target: Dimensions,
) -> Result<RgbaImage, PipelineError> {
    let (src_width, src_height) = design.dimensions();
    if src_width == 0 || src_height == 0 {
        return Err(PipelineError::ZeroDimensions {
            width: src_width,
            height: src_height,
        });
    }
    if target.width == 0 || target.height == 0 {
        return Err(PipelineError::ZeroDimensions {
            width: target.width,
            height: target.height,
        });
    }

    let tile_width = (f64::from(target.width) * spec.density / 100.0)
        .round()
        .max(1.0);
    let tile_height = (tile_width * f64::from(src_height) / f64::from(src_width))
        .round()
        .max(1.0);
    let tile_width = tile_width as u32;
    let tile_height = tile_height as u32;

    let tile = imageops::resize(
        design,
        tile_width,
        tile_height,
        imageops::FilterType::Triangle,
    );

    // Field margins are whole tile counts, never less than the
    // rotation-safe diagonal requires.
    let diagonal = 1.5 * f64::from(target.width).hypot(f64::from(target.height));
    let margin = |canvas: u32, tile: u32| -> u32 {
        let shortfall = ((diagonal - f64::from(canvas)) / 2.0).max(0.0);
        let tiles = (shortfall / f64::from(tile)).ceil() as u32;
        tiles * tile
    };
    let margin_x = margin(target.width, tile_width);
    let margin_y = margin(target.height, tile_height);
    let field_width = target.width + 2 * margin_x;
    let field_height = target.height + 2 * margin_y;

    let mut field = RgbaImage::new(field_width, field_height);
    for (x, y) in tile_placements(
        spec.kind,
        i64::from(tile_width),
        i64::from(tile_height),
        i64::from(field_width),
        i64::from(field_height),
    ) {
        imageops::overlay(&mut field, &tile, x, y);
    }

    if spec.rotation != 0.0 {
        field = rotate_about_center(
            &field,
            spec.rotation.to_radians() as f32,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        );
    }

    Ok(imageops::crop_imm(&field, margin_x, margin_y, target.width, target.height).to_image())
}
