//! Tunable quality thresholds and scoring policy.

use super::error::ThresholdError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ceiling for `max_latency_ms` (ten minutes).
pub const MAX_LATENCY_CEILING_MS: f64 = 600_000.0;

/// Ceiling for `quality_check_interval_seconds` (one day).
pub const MAX_CHECK_INTERVAL_SECONDS: f64 = 86_400.0;

/// Thresholds consumed by the probe, pool and failover controller.
///
/// # Example
///
/// ```toml
/// [quality]
/// max_latency_ms = 3000.0
/// min_fps = 5.0
/// quality_check_interval_seconds = 10.0
/// switch_threshold_score = 0.3
/// min_pool_size = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Latency at which the latency sub-score bottoms out
    pub max_latency_ms: f64,
    /// Frame rate below which the fps sub-score is capped under 0.5
    pub min_fps: f64,
    /// Seconds between monitor ticks
    pub quality_check_interval_seconds: f64,
    /// Minimum score advantage a candidate needs to trigger a switch
    pub switch_threshold_score: f64,
    /// Live candidate count below which replenishment is requested
    pub min_pool_size: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            max_latency_ms: 3000.0,
            min_fps: 5.0,
            quality_check_interval_seconds: 10.0,
            switch_threshold_score: 0.3,
            min_pool_size: 3,
        }
    }
}

impl QualityThresholds {
    /// Check the invariants: every numeric field > 0, switch threshold in (0, 1],
    /// latency and interval under their ceilings.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        positive("max_latency_ms", self.max_latency_ms)?;
        at_most("max_latency_ms", self.max_latency_ms, MAX_LATENCY_CEILING_MS)?;
        positive("min_fps", self.min_fps)?;
        positive(
            "quality_check_interval_seconds",
            self.quality_check_interval_seconds,
        )?;
        at_most(
            "quality_check_interval_seconds",
            self.quality_check_interval_seconds,
            MAX_CHECK_INTERVAL_SECONDS,
        )?;
        if self.min_pool_size == 0 {
            return Err(ThresholdError::NotPositive {
                field: "min_pool_size",
                value: 0.0,
            });
        }

        let s = self.switch_threshold_score;
        if !(s > 0.0 && s <= 1.0) {
            return Err(ThresholdError::SwitchThresholdOutOfRange(s));
        }
        Ok(())
    }

    /// Monitor tick period, clamped to the interval ceiling.
    pub fn check_interval(&self) -> Duration {
        let secs = self
            .quality_check_interval_seconds
            .min(MAX_CHECK_INTERVAL_SECONDS);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(Duration::from_secs_f64(MAX_CHECK_INTERVAL_SECONDS))
    }
}

fn at_most(field: &'static str, value: f64, max: f64) -> Result<(), ThresholdError> {
    if value <= max {
        Ok(())
    } else {
        Err(ThresholdError::TooLarge { field, value, max })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ThresholdError> {
    // NaN fails this comparison too
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ThresholdError::NotPositive { field, value })
    }
}

/// Relative weights of the four sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub latency: f64,
    pub fps: f64,
    pub activity: f64,
    pub errors: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            latency: 0.4,
            fps: 0.3,
            activity: 0.2,
            errors: 0.1,
        }
    }
}

impl ScoringWeights {
    /// Validate that weights are non-negative and sum to 1.0
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (field, value) in [
            ("weights.latency", self.latency),
            ("weights.fps", self.fps),
            ("weights.activity", self.activity),
            ("weights.errors", self.errors),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ThresholdError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        let sum = self.latency + self.fps + self.activity + self.errors;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ThresholdError::WeightsSum(sum));
        }
        Ok(())
    }
}

/// Interpolation anchors and constants of the scoring function.
///
/// The defaults follow the documented policy (1000 ms / 24 fps excellent,
/// `max_latency_ms` / 5 fps poor). They are exposed so deployments can tune
/// them without touching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Latency at or below which the latency sub-score is 1.0
    pub latency_excellent_ms: f64,
    /// Poor latency anchor as a multiple of `max_latency_ms`
    pub poor_latency_factor: f64,
    /// Frame rate at or below which the fps sub-score is 0.0
    pub fps_poor: f64,
    /// Frame rate at or above which the fps sub-score is 1.0
    pub fps_excellent: f64,
    /// Ceiling applied to the fps sub-score when fps < `min_fps`
    pub below_min_fps_cap: f64,
    /// Activity sub-score for a stream that is neither moving nor buffering
    pub stalled_activity: f64,
    pub weights: ScoringWeights,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            latency_excellent_ms: 1000.0,
            poor_latency_factor: 1.0,
            fps_poor: 5.0,
            fps_excellent: 24.0,
            below_min_fps_cap: 0.45,
            stalled_activity: 0.3,
            weights: ScoringWeights::default(),
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        positive("scoring.latency_excellent_ms", self.latency_excellent_ms)?;
        positive("scoring.poor_latency_factor", self.poor_latency_factor)?;
        positive("scoring.fps_excellent", self.fps_excellent)?;

        if !(self.fps_poor >= 0.0 && self.fps_poor < self.fps_excellent) {
            return Err(ThresholdError::InvertedAnchors {
                field: "scoring.fps",
                poor: self.fps_poor,
                excellent: self.fps_excellent,
            });
        }
        if !(0.0..0.5).contains(&self.below_min_fps_cap) {
            return Err(ThresholdError::OutOfRange {
                field: "scoring.below_min_fps_cap",
                value: self.below_min_fps_cap,
                min: 0.0,
                max: 0.5,
            });
        }
        if !(0.0..1.0).contains(&self.stalled_activity) {
            return Err(ThresholdError::OutOfRange {
                field: "scoring.stalled_activity",
                value: self.stalled_activity,
                min: 0.0,
                max: 1.0,
            });
        }

        self.weights.validate()
    }

    /// Latency at or above which the latency sub-score is 0.0.
    pub fn latency_poor_ms(&self, thresholds: &QualityThresholds) -> f64 {
        thresholds.max_latency_ms * self.poor_latency_factor
    }
}
