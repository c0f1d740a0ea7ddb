//! Editor parameter state.
//!
//! One serializable value holds everything the pipeline needs to
//! recompute the derived raster, so history snapshots and render
//! scheduling can treat the whole state as a unit.

use serde::{Deserialize, Serialize};
use spotpress_pipeline::layer::Layer;
use spotpress_pipeline::{FilterSettings, RecolorConfig, Rgb};

/// All user-editable parameters of an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    /// Segmentation and recolor parameters.
    pub recolor: RecolorConfig,
    /// Filter stack parameters.
    pub filters: FilterSettings,
    /// Layer stack, in render order.
    pub layers: Vec<Layer>,
    /// Mask brush diameter in pixels.
    pub brush_size: f64,
    /// Fabric color previews and pre-flight checks run against.
    pub fabric_color: Rgb,
    /// Whether safe-area guides are drawn in previews.
    pub show_guides: bool,
    /// Active print preset id.
    pub print_preset: String,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            recolor: RecolorConfig::default(),
            filters: FilterSettings::default(),
            layers: Vec::new(),
            brush_size: 20.0,
            fabric_color: Rgb::new(0x18, 0x18, 0x1b),
            show_guides: true,
            print_preset: String::from("standard"),
        }
    }
}
