//! Candidate stream records.

use crate::quality::QualityMetrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// Rank key of a candidate that has not been probed yet; below every score.
pub const UNPROBED_RANK: f64 = -1.0;

/// One tracked URL eligible for playback.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateStream {
    url: String,
    latest_metrics: Option<QualityMetrics>,
    consecutive_failures: u32,
    added_at: DateTime<Utc>,
    /// Insertion sequence, breaks score ties (earlier wins)
    #[serde(skip)]
    seq: u64,
}

impl CandidateStream {
    pub(crate) fn new(url: String, seq: u64) -> Self {
        Self {
            url,
            latest_metrics: None,
            consecutive_failures: 0,
            added_at: Utc::now(),
            seq,
        }
    }

    pub(crate) fn with_metrics(url: String, seq: u64, metrics: QualityMetrics) -> Self {
        let mut candidate = Self::new(url, seq);
        candidate.record(metrics);
        candidate
    }

    /// Store the latest snapshot; failures follow the probe's consecutive count.
    pub(crate) fn record(&mut self, metrics: QualityMetrics) {
        self.consecutive_failures = metrics.error_count();
        self.latest_metrics = Some(metrics);
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn latest_metrics(&self) -> Option<&QualityMetrics> {
        self.latest_metrics.as_ref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Cached score of the latest snapshot, `None` before the first probe.
    pub fn score(&self) -> Option<f64> {
        self.latest_metrics.as_ref().map(QualityMetrics::quality_score)
    }

    pub fn rank_key(&self) -> f64 {
        self.score().unwrap_or(UNPROBED_RANK)
    }

    /// Probed and scoring above zero.
    pub fn is_live(&self) -> bool {
        self.score().is_some_and(|s| s > 0.0)
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }
}

/// Descending by rank key, then ascending by insertion order.
pub(crate) fn rank_order(a: &CandidateStream, b: &CandidateStream) -> Ordering {
    b.rank_key()
        .total_cmp(&a.rank_key())
        .then_with(|| a.seq.cmp(&b.seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(url: &str, seq: u64, score: f64, errors: u32) -> CandidateStream {
        let mut sample = crate::quality::ProbeSample::unreachable(url, errors);
        sample.latency_ms = 500.0;
        CandidateStream::with_metrics(url.to_string(), seq, QualityMetrics::with_score(sample, score))
    }

    #[test]
    fn test_unprobed_candidate_ranks_below_dead() {
        let unprobed = CandidateStream::new("http://a/1.m3u8".to_string(), 0);
        let dead = scored("http://a/2.m3u8", 1, 0.0, 3);
        assert_eq!(unprobed.score(), None);
        assert!(!unprobed.is_live());
        assert_eq!(rank_order(&dead, &unprobed), Ordering::Less);
    }

    #[test]
    fn test_record_tracks_failures() {
        let mut c = CandidateStream::new("http://a/1.m3u8".to_string(), 0);
        c.record(QualityMetrics::unreachable("http://a/1.m3u8", 4));
        assert_eq!(c.consecutive_failures(), 4);
        assert_eq!(c.score(), Some(0.0));
    }

    #[test]
    fn test_ties_broken_by_insertion() {
        let first = scored("http://a/1.m3u8", 3, 0.5, 0);
        let second = scored("http://a/2.m3u8", 7, 0.5, 0);
        assert_eq!(rank_order(&first, &second), Ordering::Less);
        assert_eq!(rank_order(&second, &first), Ordering::Greater);
    }
}
