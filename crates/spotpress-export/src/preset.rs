//! Print size presets.
//!
//! Physical print areas with their target resolution and safe margin.
//! The safe margin is advisory: it is drawn as a guide overlay and
//! checked at export review time, never enforced on pixels.

use serde::Serialize;

/// A physical print target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintPreset {
    /// Stable identifier, used by CLI arguments and stored state.
    pub id: &'static str,
    /// Human-readable name.
    pub label: &'static str,
    /// Print width in inches.
    pub width_in: f64,
    /// Print height in inches.
    pub height_in: f64,
    /// Target resolution in dots per inch.
    pub dpi: u32,
    /// Safe margin from each edge, in inches.
    pub safe_margin_in: f64,
}

impl PrintPreset {
    /// Export width in pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_width(&self) -> u32 {
        (self.width_in * f64::from(self.dpi)).round() as u32
    }

    /// Export height in pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_height(&self) -> u32 {
        (self.height_in * f64::from(self.dpi)).round() as u32
    }

    /// Safe margin as a fraction of the print width, for guide
    /// overlays rendered at any resolution.
    #[must_use]
    pub fn safe_margin_fraction(&self) -> f64 {
        self.safe_margin_in / self.width_in
    }
}

/// The built-in print presets.
#[must_use]
pub const fn print_presets() -> [PrintPreset; 4] {
    [
        PrintPreset {
            id: "standard",
            label: "Standard Front Print",
            width_in: 12.0,
            height_in: 16.0,
            dpi: 300,
            safe_margin_in: 0.5,
        },
        PrintPreset {
            id: "large",
            label: "Large Format",
            width_in: 14.0,
            height_in: 18.0,
            dpi: 300,
            safe_margin_in: 0.75,
        },
        PrintPreset {
            id: "pocket",
            label: "Pocket Print",
            width_in: 4.0,
            height_in: 4.0,
            dpi: 300,
            safe_margin_in: 0.25,
        },
        PrintPreset {
            id: "allover",
            label: "All-Over Print",
            width_in: 24.0,
            height_in: 30.0,
            dpi: 150,
            safe_margin_in: 1.0,
        },
    ]
}

/// Look up a preset by identifier.
#[must_use]
pub fn find_preset(id: &str) -> Option<PrintPreset> {
    print_presets().into_iter().find(|preset| preset.id == id)
}
