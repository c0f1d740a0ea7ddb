//! The deterministic filter stack.
//!
//! Stages run in a fixed order: brightness, contrast, saturation,
//! vintage, posterize, noise, halftone. Channel math is carried in
//! `f64` across stages and clamped to 0-255 once at the end, so
//! stages compose without intermediate quantization loss. Alpha is
//! never modified, and fully transparent pixels pass through
//! unchanged.

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::FilterSettings;

/// Rec. 601 luma weights, shared by the saturation and halftone
/// stages. Halftone only compares luma against a dot-radius
/// threshold, so the four-digit precision is interchangeable with the
/// coarser 0.299/0.587/0.114 rounding there.
const LUMA_R: f64 = 0.2989;
const LUMA_G: f64 = 0.5870;
const LUMA_B: f64 = 0.1140;

fn luma(p: [f64; 3]) -> f64 {
    LUMA_R * p[0] + LUMA_G * p[1] + LUMA_B * p[2]
}

/// Apply the filter stack to a raster.
///
/// Deterministic: the same input and settings (including
/// `noise_seed`) always produce the same output. When
/// [`FilterSettings::is_neutral`] holds, the output is bit-identical
/// to the input.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn apply_filters(src: &RgbaImage, settings: &FilterSettings) -> RgbaImage {
    if settings.is_neutral() {
        return src.clone();
    }

    let (width, height) = src.dimensions();
    let mut channels: Vec<[f64; 3]> = src
        .pixels()
        .map(|p| [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])])
        .collect();

    if settings.brightness != 0.0 {
        for p in &mut channels {
            for c in p {
                *c += settings.brightness;
            }
        }
    }

    if settings.contrast != 0.0 {
        let factor = 259.0 * (settings.contrast + 255.0)
            / (255.0 * (259.0 - settings.contrast));
        for p in &mut channels {
            for c in p {
                *c = factor * (*c - 128.0) + 128.0;
            }
        }
    }

    if settings.saturation != 0.0 {
        let scale = 1.0 + settings.saturation / 100.0;
        for p in &mut channels {
            let l = luma(*p);
            for c in p {
                *c = l + (*c - l) * scale;
            }
        }
    }

    if settings.vintage != 0.0 {
        let strength = settings.vintage / 100.0;
        for p in &mut channels {
            let [r, g, b] = *p;
            let sepia = [
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
            ];
            for (c, s) in p.iter_mut().zip(sepia) {
                *c += (s - *c) * strength;
            }
        }
    }

    if settings.posterize > 0 {
        let levels = f64::from(34_u8.saturating_sub(settings.posterize).max(2));
        let step = 255.0 / (levels - 1.0);
        for p in &mut channels {
            for c in p {
                *c = (*c / step).round() * step;
            }
        }
    }

    if settings.noise != 0.0 {
        // One offset per pixel, shared by all three channels. The
        // stream advances over transparent pixels too, so the grain at
        // a given position does not depend on the alpha channel.
        let mut rng = StdRng::seed_from_u64(settings.noise_seed);
        for p in &mut channels {
            let offset = (0.5 - rng.random::<f64>()) * settings.noise;
            for c in p {
                *c += offset;
            }
        }
    }

    if settings.halftone > 0 {
        let cell = f64::from(settings.halftone) + 2.0;
        for y in 0..height {
            for x in 0..width {
                let p = &mut channels[(y * width + x) as usize];
                let cx = (f64::from(x) / cell).floor() * cell + cell / 2.0;
                let cy = (f64::from(y) / cell).floor() * cell + cell / 2.0;
                let dx = f64::from(x) - cx;
                let dy = f64::from(y) - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let radius = (cell / 2.0) * (1.0 - luma(*p).clamp(0.0, 255.0) / 255.0);
                if dist < radius {
                    for c in p {
                        *c *= 0.8;
                    }
                }
            }
        }
    }

    let mut out = src.clone();
    for (pixel, computed) in out.pixels_mut().zip(&channels) {
        if pixel[3] == 0 {
            continue;
        }
        pixel[0] = computed[0].round().clamp(0.0, 255.0) as u8;
        pixel[1] = computed[1].round().clamp(0.0, 255.0) as u8;
        pixel[2] = computed[2].round().clamp(0.0, 255.0) as u8;
    }
    out
}
