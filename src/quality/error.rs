//! Error types for quality thresholds and scoring policy.

use thiserror::Error;

/// Invalid threshold or scoring policy values.
///
/// Raised at construction time, before any monitoring starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    /// A numeric field that must be strictly positive was not
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    /// The hysteresis margin is outside (0, 1]
    #[error("switch_threshold_score must be in (0, 1] (got {0})")]
    SwitchThresholdOutOfRange(f64),

    /// Scoring weights do not add up to 1.0
    #[error("scoring weights must sum to 1.0 (got {0})")]
    WeightsSum(f64),

    /// An anchor pair is inverted (poor anchor not below good anchor)
    #[error("{field}: poor anchor {poor} must be below excellent anchor {excellent}")]
    InvertedAnchors {
        field: &'static str,
        poor: f64,
        excellent: f64,
    },

    /// A sub-score constant lies outside its allowed range
    #[error("{field} must be in [{min}, {max}) (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A duration-like field exceeds its ceiling
    #[error("{field} must be at most {max} (got {value})")]
    TooLarge {
        field: &'static str,
        value: f64,
        max: f64,
    },
}
