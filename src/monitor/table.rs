//! Published per-tick metrics.

use crate::quality::QualityMetrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Metrics for every tracked URL from one completed tick.
///
/// Tables are immutable once published; readers hold an `Arc` to a whole
/// tick and never see a partially updated one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsTable {
    tick: u64,
    completed_at: Option<DateTime<Utc>>,
    metrics: HashMap<String, QualityMetrics>,
}

impl MetricsTable {
    pub(crate) fn new(tick: u64, metrics: HashMap<String, QualityMetrics>) -> Self {
        Self {
            tick,
            completed_at: Some(Utc::now()),
            metrics,
        }
    }

    /// Sequence number of the tick that produced this table (0 = none yet).
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn get(&self, url: &str) -> Option<&QualityMetrics> {
        self.metrics.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.metrics.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QualityMetrics)> {
        self.metrics.iter().map(|(url, m)| (url.as_str(), m))
    }

    /// Consecutive failures recorded for `url`, 0 if never probed.
    pub fn error_count(&self, url: &str) -> u32 {
        self.metrics.get(url).map_or(0, |m| m.error_count())
    }
}
