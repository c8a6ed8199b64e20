//! Per-probe metric snapshots.

use super::thresholds::QualityThresholds;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Raw measurements of one probe of one URL, before scoring.
///
/// All fields are always present: an unreachable stream carries
/// `latency_ms = f64::INFINITY` rather than a missing value, which keeps the
/// scoring function total and monotonic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeSample {
    pub url: String,
    /// Time to first response byte, or infinity on transport failure
    pub latency_ms: f64,
    /// Distinct frames per second observed over the sampling window
    pub fps: f64,
    /// Sampled frames were identical across the window
    pub is_buffering: bool,
    /// Frame content changed across the window
    pub is_active: bool,
    /// Consecutive failed probes, including this one
    pub error_count: u32,
    pub timestamp: DateTime<Utc>,
}

impl ProbeSample {
    /// Sample for a stream that could not be reached at all.
    pub fn unreachable(url: impl Into<String>, error_count: u32) -> Self {
        Self {
            url: url.into(),
            latency_ms: f64::INFINITY,
            fps: 0.0,
            is_buffering: false,
            is_active: false,
            error_count,
            timestamp: Utc::now(),
        }
    }

    /// A stream that never answered and shows no frame activity.
    pub fn is_dead(&self) -> bool {
        !self.is_active && !self.latency_ms.is_finite()
    }
}

/// A scored metrics snapshot, one per probe per URL per tick.
///
/// The score is computed once when the snapshot is built and never
/// recomputed, so every reader ranking the same tick sees the same value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    #[serde(flatten)]
    sample: ProbeSample,
    quality_score: f64,
}

impl QualityMetrics {
    /// Wrap a sample with an already computed score.
    ///
    /// The score is clamped to [0, 1] and NaN becomes 0.0. Prefer [`QualityScorer::evaluate`];
    /// this exists for probes that score samples themselves.
    ///
    /// [`QualityScorer::evaluate`]: super::QualityScorer::evaluate
    pub fn with_score(sample: ProbeSample, quality_score: f64) -> Self {
        let quality_score = if quality_score.is_nan() {
            0.0
        } else {
            quality_score.clamp(0.0, 1.0)
        };
        Self {
            sample,
            quality_score,
        }
    }

    /// Snapshot for an unreachable stream. Always scores 0.0.
    pub fn unreachable(url: impl Into<String>, error_count: u32) -> Self {
        Self::with_score(ProbeSample::unreachable(url, error_count), 0.0)
    }

    pub fn url(&self) -> &str {
        &self.sample.url
    }

    pub fn latency_ms(&self) -> f64 {
        self.sample.latency_ms
    }

    pub fn fps(&self) -> f64 {
        self.sample.fps
    }

    pub fn is_buffering(&self) -> bool {
        self.sample.is_buffering
    }

    pub fn is_active(&self) -> bool {
        self.sample.is_active
    }

    pub fn error_count(&self) -> u32 {
        self.sample.error_count
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.sample.timestamp
    }

    /// Cached score in [0, 1].
    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn sample(&self) -> &ProbeSample {
        &self.sample
    }

    /// Whether this probe failed (transport or capture error).
    pub fn is_failure(&self) -> bool {
        self.sample.error_count > 0
    }

    /// Check the snapshot against hard health limits.
    ///
    /// Used for operator-facing logging; ranking relies on the score alone.
    pub fn is_healthy(&self, thresholds: &QualityThresholds, max_errors: u32) -> bool {
        self.sample.is_active
            && !self.sample.is_buffering
            && self.sample.error_count < max_errors
            && self.sample.latency_ms <= thresholds.max_latency_ms
            && self.sample.fps >= thresholds.min_fps
    }
}
