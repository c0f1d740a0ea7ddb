//! Pure raster processing and compositing core for print-design
//! workflows.
//!
//! The crate is sans-IO: every function maps in-memory buffers to
//! in-memory buffers. Decoding bytes into a raster is the only
//! boundary helper ([`decode_design`]); everything downstream is a
//! pure `raster -> raster` stage composed explicitly:
//!
//! 1. [`segment::remove_and_recolor`] — color-keyed background
//!    removal and selective recolor.
//! 2. [`mask::merge_manual_mask`] — user retouch mask merge.
//! 3. [`filter::apply_filters`] — the deterministic filter stack.
//! 4. [`render::render_layers`] — text and image layer compositing.
//! 5. [`pattern::tile_pattern`] — repeating-pattern synthesis.
//! 6. [`preflight::analyze`] — print-readiness scan.
//!
//! [`process`] composes stages 1-3, which recompute on every
//! parameter change in an editing session; [`process_staged`] does
//! the same while keeping each intermediate raster and collecting
//! per-stage diagnostics.

pub mod color;
pub mod diagnostics;
pub mod filter;
pub mod layer;
pub mod mask;
pub mod pattern;
pub mod preflight;
pub mod render;
pub mod segment;
pub mod types;

use std::time::Instant;

use image::{GrayImage, RgbaImage};

use crate::diagnostics::{PipelineDiagnostics, StageDiagnostics, StageMetrics};
pub use crate::types::{
    Dimensions, FilterSettings, PatternKind, PatternSpec, PipelineError, PreflightReport,
    RecolorConfig, Rgb,
};

/// Decode source image bytes into an RGBA raster.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] for empty bytes,
/// [`PipelineError::ImageDecode`] for undecodable bytes, and
/// [`PipelineError::ZeroDimensions`] if the decoded image has a zero
/// width or height.
pub fn decode_design(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let raster = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::ZeroDimensions { width, height });
    }
    Ok(raster)
}

/// Run segmentation, optional mask merge, and the filter stack.
///
/// This is the hot path of an editing session: it recomputes the
/// derived raster from the read-only original on every parameter
/// change.
///
/// # Errors
///
/// Returns [`PipelineError::MaskDimensionMismatch`] if a manual mask
/// is supplied with dimensions different from the original.
pub fn process(
    original: &RgbaImage,
    recolor: &RecolorConfig,
    manual_mask: Option<&GrayImage>,
    filters: &FilterSettings,
) -> Result<RgbaImage, PipelineError> {
    let mut derived = segment::remove_and_recolor(original, recolor);
    if let Some(user_mask) = manual_mask {
        mask::merge_manual_mask(&mut derived, user_mask)?;
    }
    Ok(filter::apply_filters(&derived, filters))
}

/// Results of a staged pipeline run, including intermediates.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Output of segmentation and recolor.
    pub recolored: RgbaImage,
    /// Output after the manual mask merge; `None` when no mask was
    /// supplied.
    pub masked: Option<RgbaImage>,
    /// Final output after the filter stack.
    pub filtered: RgbaImage,
    /// Dimensions shared by all stages.
    pub dimensions: Dimensions,
    /// Per-stage timings and metrics.
    pub diagnostics: PipelineDiagnostics,
}

/// Like [`process`], but keeps every intermediate raster and collects
/// per-stage diagnostics.
///
/// # Errors
///
/// Returns [`PipelineError::MaskDimensionMismatch`] if a manual mask
/// is supplied with dimensions different from the original.
pub fn process_staged(
    original: &RgbaImage,
    recolor: &RecolorConfig,
    manual_mask: Option<&GrayImage>,
    filters: &FilterSettings,
) -> Result<StagedResult, PipelineError> {
    let total_start = Instant::now();
    let (width, height) = original.dimensions();

    let stage_start = Instant::now();
    let recolored = segment::remove_and_recolor(original, recolor);
    let removed_pixel_count = original
        .pixels()
        .zip(recolored.pixels())
        .filter(|(before, after)| before[3] != 0 && after[3] == 0)
        .count() as u64;
    let segment_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Segment {
            width,
            height,
            removal_targets: recolor.remove_targets.len(),
            removed_pixel_count,
        },
    };

    let (masked, mask_diag) = if let Some(user_mask) = manual_mask {
        let stage_start = Instant::now();
        let mut merged = recolored.clone();
        mask::merge_manual_mask(&mut merged, user_mask)?;
        let active_mask_pixels =
            user_mask.pixels().filter(|p| p[0] < 255).count() as u64;
        let diag = StageDiagnostics {
            duration: stage_start.elapsed(),
            metrics: StageMetrics::Mask { active_mask_pixels },
        };
        (Some(merged), Some(diag))
    } else {
        (None, None)
    };

    let stage_start = Instant::now();
    let filter_input = masked.as_ref().unwrap_or(&recolored);
    let filtered = filter::apply_filters(filter_input, filters);
    let filter_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Filter {
            neutral: filters.is_neutral(),
        },
    };

    Ok(StagedResult {
        recolored,
        masked,
        filtered,
        dimensions: Dimensions { width, height },
        diagnostics: PipelineDiagnostics {
            segment: segment_diag,
            mask: mask_diag,
            filter: filter_diag,
            total_duration: total_start.elapsed(),
        },
    })
}
