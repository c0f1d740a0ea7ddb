//! Pipeline diagnostics: timing and counts for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! parameter tuning. Every call to
//! [`process_staged`](crate::process_staged) collects diagnostics
//! alongside the pipeline results.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
///
/// The mask stage only runs when a manual mask is supplied, so its
/// field is `None` when the stage was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: segmentation and recolor.
    pub segment: StageDiagnostics,
    /// Stage 2: manual mask merge (only when a mask was supplied).
    pub mask: Option<StageDiagnostics>,
    /// Stage 3: filter stack.
    pub filter: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Segmentation and recolor metrics.
    Segment {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Number of removal targets configured.
        removal_targets: usize,
        /// Pixels made transparent by this run.
        removed_pixel_count: u64,
    },
    /// Manual mask merge metrics.
    Mask {
        /// Mask pixels below 255 (pixels the mask can affect).
        active_mask_pixels: u64,
    },
    /// Filter stack metrics.
    Filter {
        /// Whether the settings were neutral (stage was an identity
        /// copy).
        neutral: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duration_serializes_as_fractional_seconds() {
        let stage = StageDiagnostics {
            duration: Duration::from_millis(1500),
            metrics: StageMetrics::Filter { neutral: true },
        };
        let json = serde_json::to_value(&stage).unwrap();
        assert!((json["duration"].as_f64().unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn duration_round_trips() {
        let stage = StageDiagnostics {
            duration: Duration::from_micros(12_345),
            metrics: StageMetrics::Mask {
                active_mask_pixels: 7,
            },
        };
        let json = serde_json::to_string(&stage).unwrap();
        let back: StageDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(stage.duration, back.duration);
    }

    #[test]
    fn negative_seconds_rejected() {
        let result: Result<StageDiagnostics, _> = serde_json::from_str(
            r#"{"duration":-1.0,"metrics":{"Filter":{"neutral":false}}}"#,
        );
        assert!(result.is_err());
    }
}
