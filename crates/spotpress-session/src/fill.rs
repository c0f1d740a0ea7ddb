//! The generative-fill workflow.
//!
//! Cut the painted region out of the composited design, hand the
//! holed image to the provider chain, stencil the returned raster
//! with the same mask, and hand back a patch containing only the new
//! content. The function is pure: a failure at any step returns an
//! error without having modified anything.

use std::io::Cursor;

use image::{GrayImage, ImageFormat, RgbaImage, imageops};
use spotpress_pipeline::{PipelineError, mask};
use spotpress_providers::{AllProvidersFailed, FallbackChain};

/// Errors from the generative-fill workflow.
#[derive(Debug, thiserror::Error)]
pub enum FillError {
    /// Mask or raster handling failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Every provider in the chain failed.
    #[error(transparent)]
    Providers(#[from] AllProvidersFailed),

    /// Encoding the holed image for the provider failed.
    #[error("failed to encode fill request image: {0}")]
    Encode(#[source] image::ImageError),

    /// A newer fill request superseded this one before it finished.
    /// Only produced when the provider call runs off-thread and
    /// completions are reported through a
    /// [`FillTracker`](crate::scheduler::FillTracker); the synchronous
    /// session entry point cannot be interleaved.
    #[error("fill request superseded by a newer one")]
    Superseded,
}

/// Produce a fill patch for the masked region of a composited design.
///
/// The returned patch has the design's dimensions and is transparent
/// outside the mask; committing it as an image layer at (50%, 50%)
/// with scale 100 overlays the canvas exactly. The provider's result
/// is resized to the canvas dimensions if it comes back at a
/// different size.
///
/// # Errors
///
/// Returns a [`FillError`] if the mask does not match the design, the
/// request image cannot be encoded, every provider fails, or the
/// provider response cannot be decoded.
pub fn generative_fill(
    composited: &RgbaImage,
    fill_mask: &GrayImage,
    instruction: &str,
    chain: &FallbackChain,
) -> Result<RgbaImage, FillError> {
    let holed = mask::cut_out_region(composited, fill_mask)?;

    let mut request_png = Cursor::new(Vec::new());
    holed
        .write_to(&mut request_png, ImageFormat::Png)
        .map_err(FillError::Encode)?;

    let response = chain.fill_region(&request_png.into_inner(), instruction)?;
    let mut filled = spotpress_pipeline::decode_design(&response)?;

    let (width, height) = composited.dimensions();
    if filled.dimensions() != (width, height) {
        filled = imageops::resize(&filled, width, height, imageops::FilterType::Triangle);
    }

    Ok(mask::extract_patch(&filled, fill_mask)?)
}
