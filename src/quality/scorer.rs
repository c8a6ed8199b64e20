//! Scoring function mapping a probe sample to a rank key in [0, 1].

use super::metrics::{ProbeSample, QualityMetrics};
use super::thresholds::{QualityThresholds, ScoringPolicy};

/// Score a sample against the thresholds and policy.
///
/// Weighted sum of four clamped sub-scores (latency, fps, activity, errors).
/// A dead stream (inactive with infinite latency) scores exactly 0.0.
/// Deterministic and monotonic in every input dimension.
pub fn score(sample: &ProbeSample, thresholds: &QualityThresholds, policy: &ScoringPolicy) -> f64 {
    if sample.is_dead() {
        return 0.0;
    }

    let w = &policy.weights;
    let total = latency_score(sample.latency_ms, thresholds, policy) * w.latency
        + fps_score(sample.fps, thresholds, policy) * w.fps
        + activity_score(sample.is_active, sample.is_buffering, policy) * w.activity
        + error_score(sample.error_count) * w.errors;

    total.clamp(0.0, 1.0)
}

/// 1.0 at or below the excellent anchor, 0.0 at or above the poor anchor.
pub fn latency_score(latency_ms: f64, thresholds: &QualityThresholds, policy: &ScoringPolicy) -> f64 {
    // NaN and infinity both count as unreachable
    if !latency_ms.is_finite() {
        return 0.0;
    }

    let good = policy.latency_excellent_ms;
    let poor = policy.latency_poor_ms(thresholds);

    if latency_ms <= good {
        1.0
    } else if latency_ms >= poor || poor <= good {
        0.0
    } else {
        (1.0 - (latency_ms - good) / (poor - good)).clamp(0.0, 1.0)
    }
}

/// Linear between the poor and excellent anchors, capped when below `min_fps`.
pub fn fps_score(fps: f64, thresholds: &QualityThresholds, policy: &ScoringPolicy) -> f64 {
    if fps.is_nan() {
        return 0.0;
    }

    let raw = if fps <= policy.fps_poor {
        0.0
    } else if fps >= policy.fps_excellent {
        1.0
    } else {
        (fps - policy.fps_poor) / (policy.fps_excellent - policy.fps_poor)
    };

    if fps < thresholds.min_fps {
        raw.min(policy.below_min_fps_cap)
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// 1.0 when moving, 0.0 when buffering, the stalled value otherwise.
pub fn activity_score(is_active: bool, is_buffering: bool, policy: &ScoringPolicy) -> f64 {
    if is_buffering {
        0.0
    } else if is_active {
        1.0
    } else {
        policy.stalled_activity
    }
}

pub fn error_score(error_count: u32) -> f64 {
    1.0 / (1.0 + error_count as f64)
}

/// Thresholds and policy bundled for turning samples into scored snapshots.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    thresholds: QualityThresholds,
    policy: ScoringPolicy,
}

impl QualityScorer {
    pub fn new(thresholds: QualityThresholds, policy: ScoringPolicy) -> Self {
        Self { thresholds, policy }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn score(&self, sample: &ProbeSample) -> f64 {
        score(sample, &self.thresholds, &self.policy)
    }

    /// Score a sample once and freeze it into a snapshot.
    pub fn evaluate(&self, sample: ProbeSample) -> QualityMetrics {
        let s = self.score(&sample);
        QualityMetrics::with_score(sample, s)
    }
}
