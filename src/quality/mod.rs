//! Stream quality model.
//!
//! Thresholds, per-probe metric snapshots and the pure scoring function that
//! reduces a snapshot to a rank key in [0, 1].

mod error;
mod metrics;
mod scorer;
mod thresholds;

pub use error::ThresholdError;
pub use metrics::{ProbeSample, QualityMetrics};
pub use scorer::{activity_score, error_score, fps_score, latency_score, score, QualityScorer};
pub use thresholds::{
    QualityThresholds, ScoringPolicy, ScoringWeights, MAX_CHECK_INTERVAL_SECONDS,
    MAX_LATENCY_CEILING_MS,
};
