//! Layer compositing: straight and curved text, placed images.
//!
//! Rendering is resolution independent: layer positions are
//! percentages resolved against the canvas dimensions at render time,
//! so the same layer stack can be drawn onto a preview raster or a
//! high-resolution export without touching the records.
//!
//! Asset and font failures are non-fatal per layer: the offending
//! layer is skipped, a reason is recorded, and the rest of the stack
//! still renders.

use std::collections::HashMap;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

use crate::layer::{ImageLayer, Layer, LayerId, TextLayer};
use crate::types::{PipelineError, Rgb};

/// Number of directions used to expand glyph coverage into an outline.
const STROKE_DIRECTIONS: u32 = 16;

/// Error from an [`AssetSource`] lookup.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// No asset is registered under the requested handle.
    #[error("asset {0:?} not found")]
    NotFound(String),
    /// The asset exists but could not be produced.
    #[error("asset {handle:?} failed to load: {reason}")]
    LoadFailed {
        /// The requested handle.
        handle: String,
        /// Source-specific failure description.
        reason: String,
    },
}

/// Resolves image-layer handles to rasters.
///
/// Implementations decide what a handle means: an in-memory patch, a
/// file path, anything. The renderer only sees the result.
pub trait AssetSource {
    /// Load the raster behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] when the handle cannot be resolved;
    /// the renderer treats this as a per-layer skip, not a render
    /// failure.
    fn load(&self, handle: &str) -> Result<RgbaImage, AssetError>;
}

/// In-memory asset source, used for generative-fill patches and tests.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    images: HashMap<String, RgbaImage>,
}

impl MemoryAssets {
    /// Empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raster under `handle`, replacing any existing entry.
    pub fn insert(&mut self, handle: impl Into<String>, image: RgbaImage) {
        self.images.insert(handle.into(), image);
    }

    /// Remove the raster registered under `handle`.
    pub fn remove(&mut self, handle: &str) -> Option<RgbaImage> {
        self.images.remove(handle)
    }
}

impl AssetSource for MemoryAssets {
    fn load(&self, handle: &str) -> Result<RgbaImage, AssetError> {
        self.images
            .get(handle)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(handle.to_owned()))
    }
}

/// Named font registry for text layers.
#[derive(Debug, Default)]
pub struct FontCatalog {
    fonts: HashMap<String, FontArc>,
    fallback: Option<FontArc>,
}

impl FontCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register font data under `family`.
    ///
    /// The first registered font also becomes the fallback for
    /// unknown family names.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::FontParse`] if the bytes are not a
    /// parseable font.
    pub fn register(
        &mut self,
        family: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<(), PipelineError> {
        let font =
            FontArc::try_from_vec(data).map_err(|e| PipelineError::FontParse(e.to_string()))?;
        if self.fallback.is_none() {
            self.fallback = Some(font.clone());
        }
        self.fonts.insert(family.into(), font);
        Ok(())
    }

    /// Look up `family`, falling back to the first registered font.
    #[must_use]
    pub fn resolve(&self, family: &str) -> Option<&FontArc> {
        self.fonts.get(family).or(self.fallback.as_ref())
    }
}

/// Per-character placement along a text arc, relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharPlacement {
    /// Horizontal offset of the character center from the anchor.
    pub dx: f64,
    /// Vertical offset of the character center from the anchor.
    pub dy: f64,
    /// Character rotation in radians.
    pub rotation: f64,
}

/// Compute per-character placements for curved text.
///
/// The text sits on a circular arc of radius `10000 / curvature`
/// (a zero curvature is treated as 1; callers use the straight path
/// for zero). The per-character angular step is `size * 0.5 / radius`
/// plus a letter-spacing contribution, and the whole run is centered
/// on the anchor's vertical axis. Negative curvature flips the arc
/// direction and rotates each character a further 180 degrees so it
/// reads right-side-up on the underside.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn arc_layout(
    char_count: usize,
    size: f64,
    letter_spacing: f64,
    curvature: f64,
) -> Vec<CharPlacement> {
    let radius = 10000.0 / if curvature == 0.0 { 1.0 } else { curvature };
    let angle_step = size * 0.5 / radius;
    let n = char_count as f64;
    let total_arc = n * angle_step + (n - 1.0).max(0.0) * (letter_spacing / 100.0);
    let start = -total_arc / 2.0;
    let translate_y = if curvature > 0.0 { -radius } else { radius };
    let flip = if curvature < 0.0 {
        std::f64::consts::PI
    } else {
        0.0
    };

    (0..char_count)
        .map(|i| {
            let angle = start + i as f64 * (angle_step + letter_spacing / 500.0);
            CharPlacement {
                dx: -translate_y * angle.sin(),
                dy: translate_y * angle.cos(),
                rotation: angle + flip,
            }
        })
        .collect()
}

/// Output of [`render_layers`].
#[derive(Debug)]
pub struct CompositeResult {
    /// The base raster with all renderable layers drawn on top.
    pub image: RgbaImage,
    /// Layers that could not be drawn, with the reason each one was
    /// skipped. Empty when everything rendered.
    pub skipped: Vec<(LayerId, String)>,
}

/// Draw a layer stack onto a copy of `base`.
///
/// Layers render in sequence order, later entries on top. A layer
/// whose font or asset cannot be resolved is skipped and reported in
/// [`CompositeResult::skipped`]; the remaining layers still render.
#[must_use]
pub fn render_layers(
    base: &RgbaImage,
    layers: &[Layer],
    fonts: &FontCatalog,
    assets: &dyn AssetSource,
) -> CompositeResult {
    let mut canvas = base.clone();
    let mut skipped = Vec::new();
    // Assets are cached for the duration of the pass so a handle used
    // by several layers decodes once. Failures are not cached.
    let mut cache: HashMap<String, RgbaImage> = HashMap::new();

    for layer in layers {
        match layer {
            Layer::Text(text) => {
                if let Some(font) = fonts.resolve(&text.font_family) {
                    render_text_layer(&mut canvas, text, font);
                } else {
                    skipped.push((
                        text.id,
                        format!("font {:?} not registered", text.font_family),
                    ));
                }
            }
            Layer::Image(image_layer) => {
                let source = match cache.get(&image_layer.source) {
                    Some(cached) => Ok(cached.clone()),
                    None => assets.load(&image_layer.source).inspect(|loaded| {
                        cache.insert(image_layer.source.clone(), loaded.clone());
                    }),
                };
                match source {
                    Ok(raster) => render_image_layer(&mut canvas, image_layer, &raster),
                    Err(err) => skipped.push((image_layer.id, err.to_string())),
                }
            }
        }
    }

    CompositeResult {
        image: canvas,
        skipped,
    }
}

fn render_text_layer(canvas: &mut RgbaImage, layer: &TextLayer, font: &FontArc) {
    let (width, height) = canvas.dimensions();
    let anchor_x = f64::from(width) * layer.x / 100.0;
    let anchor_y = f64::from(height) * layer.y / 100.0;

    let stroke = layer
        .stroke_color
        .filter(|_| layer.stroke_width > 0.0)
        .map(|color| (color, layer.stroke_width));

    if layer.curvature == 0.0 {
        render_straight_text(canvas, layer, font, anchor_x, anchor_y, stroke);
    } else {
        let chars: Vec<char> = layer.text.chars().collect();
        let placements = arc_layout(chars.len(), layer.size, layer.letter_spacing, layer.curvature);
        for (c, placement) in chars.into_iter().zip(placements) {
            draw_char(
                canvas,
                font,
                c,
                layer,
                anchor_x + placement.dx,
                anchor_y + placement.dy,
                placement.rotation,
                stroke,
            );
        }
    }
}

/// Straight text: one pen pass with kerning, centered on the anchor,
/// baseline-centered vertically.
fn render_straight_text(
    canvas: &mut RgbaImage,
    layer: &TextLayer,
    font: &FontArc,
    anchor_x: f64,
    anchor_y: f64,
    stroke: Option<(Rgb, f64)>,
) {
    #[allow(clippy::cast_possible_truncation)]
    let scaled = font.as_scaled(PxScale::from(layer.size as f32));
    let chars: Vec<char> = layer.text.chars().collect();

    let mut total = 0.0_f64;
    for (i, c) in chars.iter().enumerate() {
        let id = scaled.glyph_id(*c);
        total += f64::from(scaled.h_advance(id));
        if let Some(next) = chars.get(i + 1) {
            total += f64::from(scaled.kern(id, scaled.glyph_id(*next)));
        }
    }

    let mut pen = anchor_x - total / 2.0;
    for (i, c) in chars.iter().enumerate() {
        let id = scaled.glyph_id(*c);
        let advance = f64::from(scaled.h_advance(id));
        draw_char(
            canvas,
            font,
            *c,
            layer,
            pen + advance / 2.0,
            anchor_y,
            0.0,
            stroke,
        );
        pen += advance;
        if let Some(next) = chars.get(i + 1) {
            pen += f64::from(scaled.kern(id, scaled.glyph_id(*next)));
        }
    }
}

/// Rasterize one character and stamp its shadow, outline and fill,
/// centered at (`cx`, `cy`) and rotated by `rotation` radians.
#[allow(clippy::too_many_arguments)]
fn draw_char(
    canvas: &mut RgbaImage,
    font: &FontArc,
    c: char,
    layer: &TextLayer,
    cx: f64,
    cy: f64,
    rotation: f64,
    stroke: Option<(Rgb, f64)>,
) {
    let blur_pad = layer.shadow.as_ref().map_or(0.0, |s| s.blur);
    let stroke_pad = stroke.map_or(0.0, |(_, w)| w);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pad = (stroke_pad + blur_pad * 2.0).ceil() as u32 + 2;

    let Some(coverage) = rasterize_char(font, c, layer.size, pad) else {
        return;
    };

    let stroke_coverage = stroke.map(|(color, stroke_width)| {
        (color, ring_expand(&coverage, stroke_width / 2.0))
    });

    if let Some(shadow) = &layer.shadow {
        let silhouette = stroke_coverage
            .as_ref()
            .map_or_else(|| coverage.clone(), |(_, sc)| union_coverage(&coverage, sc));
        #[allow(clippy::cast_possible_truncation)]
        let blurred = if shadow.blur > 0.0 {
            imageproc::filter::gaussian_blur_f32(&silhouette, (shadow.blur / 2.0) as f32)
        } else {
            silhouette
        };
        stamp(
            canvas,
            &blurred,
            shadow.color,
            cx + shadow.offset_x,
            cy + shadow.offset_y,
            rotation,
        );
    }

    if let Some((color, stroke_cov)) = &stroke_coverage {
        stamp(canvas, stroke_cov, *color, cx, cy, rotation);
    }
    stamp(canvas, &coverage, layer.fill, cx, cy, rotation);
}

/// Rasterize one character into a padded coverage buffer whose center
/// matches the character's advance/middle-baseline center. Returns
/// `None` for whitespace and glyphs with no outline.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rasterize_char(font: &FontArc, c: char, size: f64, pad: u32) -> Option<GrayImage> {
    let scaled = font.as_scaled(PxScale::from(size as f32));
    let id = scaled.glyph_id(c);
    let advance = scaled.h_advance(id);
    let ascent = scaled.ascent();
    let descent = scaled.descent();

    let width = (f64::from(advance).ceil().max(1.0)) as u32 + 2 * pad;
    let height = (f64::from(ascent - descent).ceil().max(1.0)) as u32 + 2 * pad;

    let mut glyph = scaled.scaled_glyph(c);
    glyph.position = point(pad as f32, pad as f32 + ascent);
    let outlined = font.outline_glyph(glyph)?;

    let mut buffer = GrayImage::new(width, height);
    let bounds = outlined.px_bounds();
    outlined.draw(|gx, gy, coverage| {
        let x = bounds.min.x + gx as f32;
        let y = bounds.min.y + gy as f32;
        if x >= 0.0 && y >= 0.0 && (x as u32) < width && (y as u32) < height {
            let value = (coverage * 255.0).round().clamp(0.0, 255.0) as u8;
            let pixel = buffer.get_pixel_mut(x as u32, y as u32);
            pixel[0] = pixel[0].max(value);
        }
    });
    Some(buffer)
}

/// Expand coverage outward by stamping it along a ring of directions,
/// approximating a stroked outline of the given radius.
#[allow(clippy::cast_possible_truncation)]
fn ring_expand(coverage: &GrayImage, radius: f64) -> GrayImage {
    if radius <= 0.0 {
        return coverage.clone();
    }
    let (width, height) = coverage.dimensions();
    let mut out = coverage.clone();
    for k in 0..STROKE_DIRECTIONS {
        let angle = f64::from(k) * std::f64::consts::TAU / f64::from(STROKE_DIRECTIONS);
        let ox = (radius * angle.cos()).round() as i64;
        let oy = (radius * angle.sin()).round() as i64;
        for y in 0..height {
            for x in 0..width {
                let sx = i64::from(x) - ox;
                let sy = i64::from(y) - oy;
                if sx >= 0 && sy >= 0 && (sx as u64) < u64::from(width) && (sy as u64) < u64::from(height) {
                    #[allow(clippy::cast_sign_loss)]
                    let value = coverage.get_pixel(sx as u32, sy as u32)[0];
                    let pixel = out.get_pixel_mut(x, y);
                    pixel[0] = pixel[0].max(value);
                }
            }
        }
    }
    out
}

fn union_coverage(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = a.clone();
    for (p, q) in out.pixels_mut().zip(b.pixels()) {
        p[0] = p[0].max(q[0]);
    }
    out
}

/// Blend a tinted coverage buffer onto the canvas, centered at
/// (`cx`, `cy`), rotated by `rotation` radians.
#[allow(clippy::cast_possible_truncation)]
fn stamp(
    canvas: &mut RgbaImage,
    coverage: &GrayImage,
    color: Rgb,
    cx: f64,
    cy: f64,
    rotation: f64,
) {
    let rotated;
    let coverage = if rotation == 0.0 {
        coverage
    } else {
        rotated = rotate_coverage(coverage, rotation as f32);
        &rotated
    };

    let (cov_width, cov_height) = coverage.dimensions();
    let left = cx - f64::from(cov_width) / 2.0;
    let top = cy - f64::from(cov_height) / 2.0;
    let (width, height) = canvas.dimensions();

    for (x, y, p) in coverage.enumerate_pixels() {
        if p[0] == 0 {
            continue;
        }
        let tx = (left + f64::from(x)).round();
        let ty = (top + f64::from(y)).round();
        if tx < 0.0 || ty < 0.0 {
            continue;
        }
        #[allow(clippy::cast_sign_loss)]
        let (tx, ty) = (tx as u32, ty as u32);
        if tx >= width || ty >= height {
            continue;
        }
        blend_over(canvas.get_pixel_mut(tx, ty), color, f32::from(p[0]) / 255.0);
    }
}

/// Rotate a coverage buffer about its center, first padding it to a
/// square large enough that no corner is cropped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rotate_coverage(coverage: &GrayImage, rotation: f32) -> GrayImage {
    let (width, height) = coverage.dimensions();
    let diag = f64::from(width).hypot(f64::from(height)).ceil() as u32;
    let mut padded = GrayImage::new(diag, diag);
    imageops::overlay(
        &mut padded,
        coverage,
        i64::from((diag - width) / 2),
        i64::from((diag - height) / 2),
    );
    rotate_about_center(&padded, rotation, Interpolation::Bilinear, Luma([0]))
}

/// Source-over blend of a solid color with the given alpha.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_over(dst: &mut Rgba<u8>, color: Rgb, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    let dst_alpha = f32::from(dst[3]) / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let blend = |src: u8, existing: u8| {
        let s = f32::from(src) / 255.0;
        let d = f32::from(existing) / 255.0;
        let v = (s * alpha + d * dst_alpha * (1.0 - alpha)) / out_alpha;
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        blend(color.r, dst[0]),
        blend(color.g, dst[1]),
        blend(color.b, dst[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}

/// Draw a placed image layer: scaled to `scale%` of the canvas width,
/// aspect preserved, rotated about its center at the anchor.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_image_layer(canvas: &mut RgbaImage, layer: &ImageLayer, source: &RgbaImage) {
    let (canvas_width, canvas_height) = canvas.dimensions();
    let (src_width, src_height) = source.dimensions();
    if src_width == 0 || src_height == 0 {
        return;
    }

    let target_width = f64::from(canvas_width) * layer.scale / 100.0;
    let target_height = target_width * f64::from(src_height) / f64::from(src_width);
    if target_width < 1.0 || target_height < 1.0 {
        return;
    }

    let resized = imageops::resize(
        source,
        target_width.round() as u32,
        target_height.round() as u32,
        imageops::FilterType::Triangle,
    );

    let placed = if layer.rotation == 0.0 {
        resized
    } else {
        let (w, h) = resized.dimensions();
        let diag = f64::from(w).hypot(f64::from(h)).ceil() as u32;
        let mut padded = RgbaImage::new(diag, diag);
        imageops::overlay(
            &mut padded,
            &resized,
            i64::from((diag - w) / 2),
            i64::from((diag - h) / 2),
        );
        rotate_about_center(
            &padded,
            (layer.rotation.to_radians()) as f32,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        )
    };

    let (placed_width, placed_height) = placed.dimensions();
    let anchor_x = f64::from(canvas_width) * layer.x / 100.0;
    let anchor_y = f64::from(canvas_height) * layer.y / 100.0;
    let left = (anchor_x - f64::from(placed_width) / 2.0).round() as i64;
    let top = (anchor_y - f64::from(placed_height) / 2.0).round() as i64;
    imageops::overlay(canvas, &placed, left, top);
}
