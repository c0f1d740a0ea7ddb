//! Integration test: run a synthetic design through the full pipeline
//! and export it at a print preset size.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{Rgba, RgbaImage};
use spotpress_export::{ExportSize, encode_png, export_dimensions, fit_for_export};
use spotpress_pipeline::layer::{ImageLayer, Layer, LayerId};
use spotpress_pipeline::render::{FontCatalog, MemoryAssets, render_layers};
use spotpress_pipeline::{
    Dimensions, FilterSettings, PatternKind, PatternSpec, RecolorConfig, Rgb,
};

/// A white circle on a solid magenta background, the classic
/// remove-the-backdrop starting point.
fn synthetic_design() -> RgbaImage {
    RgbaImage::from_fn(120, 120, |x, y| {
        let dx = f64::from(x) - 60.0;
        let dy = f64::from(y) - 60.0;
        if (dx * dx + dy * dy).sqrt() < 35.0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([255, 0, 255, 255])
        }
    })
}

#[test]
fn full_workflow_to_print_export() {
    let original = synthetic_design();

    // Remove the magenta backdrop, brighten slightly.
    let recolor = RecolorConfig {
        remove_targets: vec![Rgb::new(255, 0, 255)],
        ..RecolorConfig::default()
    };
    let filters = FilterSettings {
        brightness: 10.0,
        ..FilterSettings::default()
    };
    let processed =
        spotpress_pipeline::process(&original, &recolor, None, &filters).expect("pipeline");
    assert_eq!(processed.get_pixel(2, 2)[3], 0, "backdrop removed");
    assert_eq!(processed.get_pixel(60, 60)[3], 255, "subject kept");

    // Composite a badge image layer in the corner.
    let mut assets = MemoryAssets::new();
    assets.insert(
        "badge",
        RgbaImage::from_pixel(10, 10, Rgba([0, 128, 255, 255])),
    );
    let layers = [Layer::Image(ImageLayer {
        id: LayerId(1),
        source: "badge".into(),
        x: 85.0,
        y: 85.0,
        scale: 20.0,
        rotation: 0.0,
    })];
    let composite = render_layers(&processed, &layers, &FontCatalog::new(), &assets);
    assert!(composite.skipped.is_empty());
    assert_eq!(composite.image.get_pixel(102, 102)[2], 255, "badge drawn");

    // Pre-flight against a dark fabric.
    let report = spotpress_pipeline::preflight::analyze(&composite.image, Rgb::new(24, 24, 27));
    assert!(!report.low_contrast, "white-on-dark passes contrast");
    assert!(!report.spot_colors.is_empty());

    // Tile the composited design as an all-over pattern.
    let pattern = spotpress_pipeline::pattern::tile_pattern(
        &composite.image,
        &PatternSpec {
            kind: PatternKind::HalfDrop,
            density: 30.0,
            rotation: 20.0,
        },
        Dimensions {
            width: 300,
            height: 200,
        },
    )
    .expect("tiling");
    assert_eq!(pattern.dimensions(), (300, 200));

    // Export the single design at the pocket preset size.
    let target = export_dimensions(
        Dimensions {
            width: composite.image.width(),
            height: composite.image.height(),
        },
        &ExportSize::Preset(String::from("pocket")),
    )
    .expect("sizing");
    assert_eq!((target.width, target.height), (1200, 1200));

    let fitted = fit_for_export(&composite.image, target).expect("fit");
    assert_eq!(fitted.dimensions(), (1200, 1200));

    let png = encode_png(&fitted).expect("encode");
    let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
    assert_eq!(decoded.dimensions(), (1200, 1200));
    assert_eq!(
        decoded.get_pixel(600, 600)[3],
        255,
        "subject survives export"
    );
}
