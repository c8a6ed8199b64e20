//! Error types for the stream pool.

use crate::quality::ThresholdError;
use thiserror::Error;

/// Errors from pool construction and explicit insertion.
///
/// Capacity rejections are not errors; see [`AddOutcome`](super::AddOutcome).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    /// Stream URL could not be parsed
    #[error("invalid stream URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Quality thresholds rejected at construction
    #[error("invalid quality thresholds: {0}")]
    Thresholds(#[from] ThresholdError),

    /// Hard capacity below the replenishment target
    #[error("max_pool_size ({max}) must be at least min_pool_size ({min})")]
    CapacityBelowTarget { max: usize, min: usize },

    /// Eviction ceiling of zero would evict every candidate
    #[error("max_consecutive_failures must be at least 1")]
    ZeroFailureCeiling,
}
