//! Shared types for the spotpress raster pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference design
/// rasters without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `GrayImage`, used for manual and generative-fill masks.
pub use image::GrayImage;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel, 0-255.
    pub r: u8,
    /// Green channel, 0-255.
    pub g: u8,
    /// Blue channel, 0-255.
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A color in HSL space: hue 0-360 (wrapping), saturation and
/// lightness 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    /// Hue in degrees, 0-360.
    pub h: f64,
    /// Saturation percentage, 0-100.
    pub s: f64,
    /// Lightness percentage, 0-100.
    pub l: f64,
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Configuration for the segmentation and recolor stage.
///
/// Removal targets are matched in insertion order (first match wins);
/// duplicates are allowed and are not deduplicated. Tolerances are
/// inclusive thresholds against Euclidean RGB distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecolorConfig {
    /// Colors to make transparent, in priority order.
    pub remove_targets: Vec<Rgb>,
    /// Inclusive distance threshold for removal matching.
    pub remove_tolerance: f64,
    /// Optional single color to selectively recolor.
    pub edit_target: Option<Rgb>,
    /// Inclusive distance threshold for the edit target.
    pub edit_tolerance: f64,
    /// Hue shift in degrees, wrapped into [0, 360).
    pub hue_shift: f64,
    /// Saturation shift in percentage points; the result is clamped
    /// to [0, 100].
    pub sat_shift: f64,
}

impl Default for RecolorConfig {
    fn default() -> Self {
        Self {
            remove_targets: Vec::new(),
            remove_tolerance: 30.0,
            edit_target: None,
            edit_tolerance: 40.0,
            hue_shift: 0.0,
            sat_shift: 0.0,
        }
    }
}

/// Parameters for the fixed-order filter stack.
///
/// Application order is brightness, contrast, saturation, vintage,
/// posterize, noise, halftone, and is significant: the same parameters
/// applied in a different order produce a different image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Additive brightness offset, -100..100.
    pub brightness: f64,
    /// Contrast parameter, -100..100.
    pub contrast: f64,
    /// Saturation adjustment, -100..100 (-100 = grayscale).
    pub saturation: f64,
    /// Sepia blend strength, 0..100.
    pub vintage: f64,
    /// Posterize strength, 0..32. Quantization levels are
    /// `max(2, 34 - strength)`; 0 disables the stage.
    pub posterize: u8,
    /// Luminance grain amplitude, 0..100.
    pub noise: f64,
    /// Halftone cell-size units, 0..10. Cell size is `halftone + 2`
    /// pixels; 0 disables the stage.
    pub halftone: u8,
    /// Seed for the noise stage. The stack is deterministic for a
    /// given settings value.
    pub noise_seed: u64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            vintage: 0.0,
            posterize: 0,
            noise: 0.0,
            halftone: 0,
            noise_seed: 0,
        }
    }
}

impl FilterSettings {
    /// Returns `true` when every stage is at its neutral value, in
    /// which case applying the stack is the identity.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.brightness == 0.0
            && self.contrast == 0.0
            && self.saturation == 0.0
            && self.vintage == 0.0
            && self.posterize == 0
            && self.noise == 0.0
            && self.halftone == 0
    }
}

/// Repeating-pattern tile layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    /// Regular grid, no offset.
    Grid,
    /// Every other row offset by half a tile width.
    Brick,
    /// Every other column offset by half a tile height.
    HalfDrop,
}

/// Specification for the pattern tiler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Tile layout.
    pub kind: PatternKind,
    /// Tile width as a percentage of the target canvas width.
    pub density: f64,
    /// Rotation of the assembled tile field, in degrees.
    pub rotation: f64,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            kind: PatternKind::Grid,
            density: 20.0,
            rotation: 0.0,
        }
    }
}

/// A dominant color extracted from a design, quantized for print
/// separation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotColor {
    /// Quantized color (each channel a multiple of 32, capped at 255).
    pub color: Rgb,
    /// Number of sampled pixels that quantized to this color.
    pub frequency: u64,
}

/// Result of a print pre-flight scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightReport {
    /// Thin strokes were detected that may break during printing.
    pub thin_lines: bool,
    /// A significant share of the design sits close to the fabric color.
    pub low_contrast: bool,
    /// Human-readable descriptions of the detected issues, in
    /// detection order.
    pub issues: Vec<String>,
    /// Dominant colors ranked by frequency, most frequent first.
    pub spot_colors: Vec<SpotColor>,
}

/// Errors that can occur in the raster pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The decoded image has a zero width or height.
    #[error("image has zero dimension ({width}x{height})")]
    ZeroDimensions {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },

    /// A mask's dimensions do not match the design raster.
    #[error("mask is {mask_width}x{mask_height} but design is {width}x{height}")]
    MaskDimensionMismatch {
        /// Mask width.
        mask_width: u32,
        /// Mask height.
        mask_height: u32,
        /// Design width.
        width: u32,
        /// Design height.
        height: u32,
    },

    /// A font could not be parsed.
    #[error("failed to parse font data: {0}")]
    FontParse(String),

    /// A hex color string could not be parsed.
    #[error("invalid hex color {0:?}")]
    InvalidHexColor(String),
}
