//! Layer records for the compositor.
//!
//! Layers form a closed sum type: the renderer matches exhaustively,
//! so adding a kind is a compile-visible change everywhere it matters.
//! Positions are percentages of the canvas so a layer stack can be
//! re-rendered at any export resolution without rescaling its records.

use serde::{Deserialize, Serialize};

use crate::types::Rgb;

/// Stable identity for a layer, assigned monotonically by the session
/// and never reused, so references survive reordering and removal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LayerId(pub u64);

/// Drop shadow parameters for a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    /// Shadow color.
    pub color: Rgb,
    /// Gaussian blur sigma in pixels; 0 means a hard shadow.
    pub blur: f64,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
}

/// A text layer, optionally bent along a circular arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    /// Layer identity.
    pub id: LayerId,
    /// The text to render.
    pub text: String,
    /// Font name, resolved through the render context's catalog.
    pub font_family: String,
    /// Font size in pixels.
    pub size: f64,
    /// Fill color.
    pub fill: Rgb,
    /// Optional outline color; drawn under the fill.
    pub stroke_color: Option<Rgb>,
    /// Outline width in pixels; ignored when `stroke_color` is `None`.
    pub stroke_width: f64,
    /// Optional drop shadow, drawn under both outline and fill.
    pub shadow: Option<TextShadow>,
    /// Anchor x as a percentage of the canvas width.
    pub x: f64,
    /// Anchor y as a percentage of the canvas height.
    pub y: f64,
    /// Arc bend, -100..100. Zero is straight; positive bends the
    /// baseline upward (text on top of a circle), negative downward.
    pub curvature: f64,
    /// Extra spacing between characters, in the same units the arc
    /// math uses (hundredths of a radian along the arc).
    pub letter_spacing: f64,
}

/// A placed raster image layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLayer {
    /// Layer identity.
    pub id: LayerId,
    /// Asset handle, resolved through the render context's
    /// [`AssetSource`](crate::render::AssetSource).
    pub source: String,
    /// Center x as a percentage of the canvas width.
    pub x: f64,
    /// Center y as a percentage of the canvas height.
    pub y: f64,
    /// Target width as a percentage of the canvas width.
    pub scale: f64,
    /// Rotation about the image center, in degrees.
    pub rotation: f64,
}

/// A renderable layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    /// Text, straight or curved.
    Text(TextLayer),
    /// A placed raster image.
    Image(ImageLayer),
}

impl Layer {
    /// The layer's stable identity.
    #[must_use]
    pub const fn id(&self) -> LayerId {
        match self {
            Self::Text(layer) => layer.id,
            Self::Image(layer) => layer.id,
        }
    }
}

impl TextLayer {
    /// A centered, unstyled text layer with editor defaults.
    #[must_use]
    pub fn new(id: LayerId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            font_family: String::from("sans-serif"),
            size: 48.0,
            fill: Rgb::new(255, 255, 255),
            stroke_color: None,
            stroke_width: 0.0,
            shadow: None,
            x: 50.0,
            y: 50.0,
            curvature: 0.0,
            letter_spacing: 0.0,
        }
    }
}
