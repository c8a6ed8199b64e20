//! Ranked candidate table guarded by the pool's lock.

use super::candidate::{rank_order, CandidateStream};
use crate::monitor::MetricsTable;
use crate::quality::QualityMetrics;
use std::collections::HashSet;

/// Candidates kept sorted by rank after every write, so readers only ever
/// see a fully ordered table.
#[derive(Debug, Default)]
pub(crate) struct PoolState {
    candidates: Vec<CandidateStream>,
    active_url: Option<String>,
    evicted: HashSet<String>,
    next_seq: u64,
}

impl PoolState {
    pub fn candidates(&self) -> &[CandidateStream] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    pub fn get(&self, url: &str) -> Option<&CandidateStream> {
        self.candidates.iter().find(|c| c.url() == url)
    }

    pub fn active_url(&self) -> Option<&str> {
        self.active_url.as_deref()
    }

    pub fn set_active(&mut self, url: Option<String>) {
        self.active_url = url;
    }

    pub fn is_evicted(&self, url: &str) -> bool {
        self.evicted.contains(url)
    }

    pub fn clear_evicted(&mut self, url: &str) {
        self.evicted.remove(url);
    }

    /// Insert a new candidate and restore rank order.
    pub fn insert(&mut self, url: String, metrics: Option<QualityMetrics>) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let candidate = match metrics {
            Some(metrics) => CandidateStream::with_metrics(url, seq, metrics),
            None => CandidateStream::new(url, seq),
        };
        self.candidates.push(candidate);
        self.resort();
    }

    pub fn remove(&mut self, url: &str) -> Option<CandidateStream> {
        let index = self.candidates.iter().position(|c| c.url() == url)?;
        Some(self.candidates.remove(index))
    }

    /// Remove for exhaustion and remember the URL so discovery skips it.
    pub fn evict_exhausted(&mut self, url: &str) -> Option<CandidateStream> {
        let removed = self.remove(url)?;
        self.evicted.insert(url.to_string());
        Some(removed)
    }

    /// Lowest-ranked candidate that is not currently playing.
    pub fn worst_evictable(&self) -> Option<&CandidateStream> {
        self.candidates
            .iter()
            .rev()
            .find(|c| Some(c.url()) != self.active_url.as_deref())
    }

    /// Highest-ranked live candidate, optionally skipping one URL.
    pub fn best(&self, exclude: Option<&str>) -> Option<&CandidateStream> {
        self.candidates
            .iter()
            .filter(|c| Some(c.url()) != exclude)
            .find(|c| c.is_live())
    }

    pub fn live_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_live()).count()
    }

    /// Record a tick's metrics, then evict candidates whose consecutive
    /// failures reached `max_failures`. The active URL is never evicted.
    ///
    /// Returns the evicted candidates.
    pub fn apply_tick(&mut self, table: &MetricsTable, max_failures: u32) -> Vec<CandidateStream> {
        for candidate in &mut self.candidates {
            if let Some(metrics) = table.get(candidate.url()) {
                candidate.record(metrics.clone());
            }
        }

        let exhausted: Vec<String> = self
            .candidates
            .iter()
            .filter(|c| c.consecutive_failures() >= max_failures)
            .filter(|c| Some(c.url()) != self.active_url.as_deref())
            .map(|c| c.url().to_string())
            .collect();

        let evicted = exhausted
            .iter()
            .filter_map(|url| self.evict_exhausted(url))
            .collect();

        self.resort();
        evicted
    }

    fn resort(&mut self) {
        // Stable, and fully ordered by (score desc, insertion asc)
        self.candidates.sort_by(rank_order);
    }
}
