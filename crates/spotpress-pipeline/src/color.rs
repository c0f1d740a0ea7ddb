//! Color model conversions and distance metrics.
//!
//! All classification in the pipeline is done with Euclidean distance in
//! RGB space; selective recoloring round-trips through HSL so hue and
//! saturation can be shifted while lightness is preserved.

use crate::types::{Hsl, PipelineError, Rgb};

/// Euclidean distance between two RGB colors.
///
/// Zero iff the colors are identical; symmetric in its arguments. The
/// maximum possible distance (black to white) is `255 * sqrt(3)`,
/// roughly 441.67.
#[must_use]
pub fn rgb_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = f64::from(a.r) - f64::from(b.r);
    let dg = f64::from(a.g) - f64::from(b.g);
    let db = f64::from(a.b) - f64::from(b.b);
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Convert an RGB color to HSL.
///
/// Hue is in degrees (0-360), saturation and lightness in percent
/// (0-100). For achromatic colors hue and saturation are both zero.
/// When two channels tie for the maximum, the red channel takes
/// priority over green, and green over blue.
#[must_use]
#[allow(clippy::float_cmp, clippy::many_single_char_names)]
pub fn rgb_to_hsl(color: Rgb) -> Hsl {
    let r = f64::from(color.r) / 255.0;
    let g = f64::from(color.g) / 255.0;
    let b = f64::from(color.b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl {
            h: 0.0,
            s: 0.0,
            l: l * 100.0,
        };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl {
        h: h / 6.0 * 360.0,
        s: s * 100.0,
        l: l * 100.0,
    }
}

/// Convert an HSL color back to RGB.
///
/// Hue wraps modulo 360; saturation and lightness are expected in
/// [0, 100]. Channels are rounded to the nearest integer, so a full
/// round trip through [`rgb_to_hsl`] may differ by at most one unit
/// per channel.
#[must_use]
pub fn hsl_to_rgb(color: Hsl) -> Rgb {
    let h = color.h.rem_euclid(360.0) / 360.0;
    let s = (color.s / 100.0).clamp(0.0, 1.0);
    let l = (color.l / 100.0).clamp(0.0, 1.0);

    if s == 0.0 {
        let v = to_channel(l);
        return Rgb::new(v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Rgb::new(
        to_channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        to_channel(hue_to_rgb(p, q, h)),
        to_channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
    )
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

impl Rgb {
    /// Parse a `#rrggbb` or `rrggbb` hex string.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHexColor`] if the string is not
    /// exactly six hex digits after an optional leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self, PipelineError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PipelineError::InvalidHexColor(hex.to_owned()));
        }
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| PipelineError::InvalidHexColor(hex.to_owned()))
        };
        Ok(Self::new(parse(0..2)?, parse(2..4)?, parse(4..6)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_for_identical_colors() {
        let c = Rgb::new(120, 45, 200);
        assert!(rgb_distance(c, c).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Rgb::new(10, 200, 30);
        let b = Rgb::new(250, 0, 99);
        assert!((rgb_distance(a, b) - rgb_distance(b, a)).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_black_to_white() {
        let d = rgb_distance(Rgb::new(0, 0, 0), Rgb::new(255, 255, 255));
        assert!((d - 255.0 * 3.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn pure_red_to_hsl() {
        let hsl = rgb_to_hsl(Rgb::new(255, 0, 0));
        assert!((hsl.h - 0.0).abs() < 1e-9);
        assert!((hsl.s - 100.0).abs() < 1e-9);
        assert!((hsl.l - 50.0).abs() < 1e-9);
    }

    #[test]
    fn pure_green_to_hsl() {
        let hsl = rgb_to_hsl(Rgb::new(0, 255, 0));
        assert!((hsl.h - 120.0).abs() < 1e-9);
    }

    #[test]
    fn gray_is_achromatic() {
        let hsl = rgb_to_hsl(Rgb::new(128, 128, 128));
        assert!(hsl.h.abs() < f64::EPSILON);
        assert!(hsl.s.abs() < f64::EPSILON);
    }

    #[test]
    fn round_trip_within_one_unit_per_channel() {
        for r in (0..=255).step_by(17) {
            for g in (0..=255).step_by(17) {
                for b in (0..=255).step_by(17) {
                    #[allow(clippy::cast_possible_truncation)]
                    let original = Rgb::new(r as u8, g as u8, b as u8);
                    let back = hsl_to_rgb(rgb_to_hsl(original));
                    assert!(
                        i16::from(original.r).abs_diff(i16::from(back.r)) <= 1
                            && i16::from(original.g).abs_diff(i16::from(back.g)) <= 1
                            && i16::from(original.b).abs_diff(i16::from(back.b)) <= 1,
                        "round trip {original:?} -> {back:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn hue_wraps_modulo_360() {
        let a = hsl_to_rgb(Hsl {
            h: 380.0,
            s: 80.0,
            l: 50.0,
        });
        let b = hsl_to_rgb(Hsl {
            h: 20.0,
            s: 80.0,
            l: 50.0,
        });
        assert_eq!(a, b);
    }

    #[test]
    fn negative_hue_wraps() {
        let a = hsl_to_rgb(Hsl {
            h: -60.0,
            s: 100.0,
            l: 50.0,
        });
        let b = hsl_to_rgb(Hsl {
            h: 300.0,
            s: 100.0,
            l: 50.0,
        });
        assert_eq!(a, b);
    }

    #[test]
    fn hex_with_and_without_hash() {
        assert_eq!(Rgb::from_hex("#18181b").unwrap(), Rgb::new(0x18, 0x18, 0x1b));
        assert_eq!(Rgb::from_hex("ff00aa").unwrap(), Rgb::new(255, 0, 170));
    }

    #[test]
    fn hex_rejects_malformed_input() {
        assert!(Rgb::from_hex("#fff").is_err());
        assert!(Rgb::from_hex("not-a-color").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
        assert!(Rgb::from_hex("").is_err());
    }
}
