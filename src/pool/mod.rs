//! Ranked, bounded pool of candidate streams.
//!
//! The pool owns an [`AsyncStreamMonitor`] over its candidate URLs and
//! re-ranks the table after every tick. It evicts candidates that keep
//! failing and asks its owner for more candidates, through
//! [`PoolEvent::NeedsCandidates`], when too few remain live.

mod candidate;
mod config;
mod error;
mod events;
mod replenish;
mod state;


pub use candidate::{CandidateStream, UNPROBED_RANK};
pub use config::PoolConfig;
pub use error::PoolError;
pub use events::{EvictionReason, PoolEvent};
pub use replenish::Replenisher;

use crate::monitor::{AsyncStreamMonitor, MetricsTable, ObserverError, QualityObserver, UrlTracker};
use crate::probe::QualityProbe;
use crate::quality::{QualityMetrics, QualityThresholds};
use state::PoolState;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Capacity of the pool event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of inserting a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// New candidate inserted
    Added,
    /// Inserted at capacity in place of the worst candidate
    Replaced { evicted: String },
    /// URL already tracked; nothing changed
    AlreadyPresent,
    /// Pool full and the URL would not outrank any candidate
    RejectedAtCapacity,
    /// Previously evicted for exhaustion; only explicit `add` re-admits it
    SkippedEvicted,
}

impl AddOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, AddOutcome::Added | AddOutcome::Replaced { .. })
    }
}

/// Ranked, deduplicated, bounded set of candidate streams.
pub struct StreamPool {
    shared: Arc<PoolShared>,
    monitor: AsyncStreamMonitor,
    probe: Arc<dyn QualityProbe>,
}

/// State reachable from the monitor observer.
struct PoolShared {
    state: RwLock<PoolState>,
    tracker: Arc<UrlTracker>,
    thresholds: QualityThresholds,
    config: PoolConfig,
    events: broadcast::Sender<PoolEvent>,
}

impl StreamPool {
    /// Create an empty pool. Invalid thresholds or sizing are rejected here,
    /// before any monitoring starts.
    pub fn new(
        probe: Arc<dyn QualityProbe>,
        thresholds: QualityThresholds,
        config: PoolConfig,
    ) -> Result<Self, PoolError> {
        thresholds.validate()?;
        config.validate(thresholds.min_pool_size)?;

        let tracker = Arc::new(UrlTracker::new());
        let monitor = AsyncStreamMonitor::with_tracker(
            Arc::clone(&probe),
            thresholds.check_interval(),
            Arc::clone(&tracker),
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let shared = Arc::new(PoolShared {
            state: RwLock::new(PoolState::default()),
            tracker,
            thresholds,
            config,
            events,
        });
        monitor.register_observer(Arc::clone(&shared) as Arc<dyn QualityObserver>);

        Ok(Self {
            shared,
            monitor,
            probe,
        })
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.shared.thresholds
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Subscribe to pool events.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.shared.events.subscribe()
    }

    /// Register an extra observer on the internal monitor.
    pub fn register_observer(&self, observer: Arc<dyn QualityObserver>) {
        self.monitor.register_observer(observer);
    }

    /// Insert `url` explicitly.
    ///
    /// Clears any earlier exhaustion mark. At capacity the URL is probed once
    /// and replaces the worst candidate only if it scores higher; otherwise
    /// the rejection is logged and reported as [`AddOutcome::RejectedAtCapacity`].
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidUrl` if `url` does not parse.
    pub async fn add(&self, url: &str) -> Result<AddOutcome, PoolError> {
        let url = normalize(url)?;
        self.shared.write().clear_evicted(&url);
        Ok(self.insert(url).await)
    }

    /// Insert URLs supplied by discovery, skipping previously exhausted ones
    /// and anything that does not parse. Returns the number inserted.
    pub async fn add_discovered<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inserted = 0;
        for raw in urls {
            let url = match normalize(raw.as_ref()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring discovered URL");
                    continue;
                }
            };
            if self.shared.read().is_evicted(&url) {
                tracing::debug!(url = %url, "Skipping previously evicted URL");
                continue;
            }
            if self.insert(url).await.is_inserted() {
                inserted += 1;
            }
        }
        inserted
    }

    async fn insert(&self, url: String) -> AddOutcome {
        {
            let mut state = self.shared.write();
            if state.contains(&url) {
                return AddOutcome::AlreadyPresent;
            }
            if state.len() < self.shared.config.max_pool_size {
                state.insert(url.clone(), None);
                drop(state);
                self.shared.admitted(&url);
                return AddOutcome::Added;
            }
        }

        // At capacity: measure the newcomer before deciding
        let metrics = self.probe_once(&url).await;
        let score = metrics.quality_score();

        let mut state = self.shared.write();
        if state.contains(&url) {
            return AddOutcome::AlreadyPresent;
        }
        if state.len() < self.shared.config.max_pool_size {
            state.insert(url.clone(), Some(metrics));
            drop(state);
            self.shared.admitted(&url);
            return AddOutcome::Added;
        }

        let worst = state
            .worst_evictable()
            .map(|c| (c.url().to_string(), c.rank_key()));
        match worst {
            Some((worst_url, worst_key)) if score > 0.0 && score > worst_key => {
                state.remove(&worst_url);
                state.insert(url.clone(), Some(metrics));
                drop(state);

                self.shared.tracker.untrack(&worst_url);
                tracing::info!(
                    url = %url,
                    evicted = %worst_url,
                    score,
                    "Replaced worst candidate at capacity"
                );
                self.shared.emit(PoolEvent::Evicted {
                    url: worst_url.clone(),
                    reason: EvictionReason::Displaced { by: url.clone() },
                });
                self.shared.admitted(&url);
                AddOutcome::Replaced { evicted: worst_url }
            }
            _ => {
                tracing::info!(
                    url = %url,
                    score,
                    capacity = self.shared.config.max_pool_size,
                    "Pool at capacity, candidate rejected"
                );
                AddOutcome::RejectedAtCapacity
            }
        }
    }

    async fn probe_once(&self, url: &str) -> QualityMetrics {
        match tokio::time::timeout(self.probe.timeout(), self.probe.probe(url, 0)).await {
            Ok(metrics) => metrics,
            Err(_) => QualityMetrics::unreachable(url, 1),
        }
    }

    /// Remove `url` from the pool. Returns false if it was not present.
    pub fn remove(&self, url: &str) -> bool {
        let removed = self.shared.write().remove(url).is_some();
        if removed {
            self.shared.tracker.untrack(url);
        }
        removed
    }

    /// URL of the highest-scored live candidate, `None` if none is live.
    pub fn best(&self) -> Option<String> {
        self.best_with_score().map(|(url, _)| url)
    }

    /// Best live candidate with its score.
    pub fn best_with_score(&self) -> Option<(String, f64)> {
        self.best_excluding(None)
    }

    /// Best live candidate other than `exclude`.
    pub fn best_excluding(&self, exclude: Option<&str>) -> Option<(String, f64)> {
        self.shared
            .read()
            .best(exclude)
            .map(|c| (c.url().to_string(), c.rank_key()))
    }

    /// `(url, score)` in rank order: score descending, earlier insertion
    /// first on ties. Unprobed candidates come last with score 0.
    pub fn rank(&self) -> Vec<(String, f64)> {
        self.shared
            .read()
            .candidates()
            .iter()
            .map(|c| (c.url().to_string(), c.score().unwrap_or(0.0)))
            .collect()
    }

    /// Live candidates in rank order.
    pub fn live_ranked(&self) -> Vec<(String, f64)> {
        self.shared
            .read()
            .candidates()
            .iter()
            .filter(|c| c.is_live())
            .map(|c| (c.url().to_string(), c.rank_key()))
            .collect()
    }

    /// Copy of every candidate in rank order.
    pub fn candidates(&self) -> Vec<CandidateStream> {
        self.shared.read().candidates().to_vec()
    }

    pub fn candidate(&self, url: &str) -> Option<CandidateStream> {
        self.shared.read().get(url).cloned()
    }

    /// Latest cached score of `url`, if tracked and probed.
    pub fn score_of(&self, url: &str) -> Option<f64> {
        self.shared.read().get(url).and_then(CandidateStream::score)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.shared.read().contains(url)
    }

    pub fn is_evicted(&self, url: &str) -> bool {
        self.shared.read().is_evicted(url)
    }

    pub fn len(&self) -> usize {
        self.shared.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn live_count(&self) -> usize {
        self.shared.read().live_count()
    }

    /// Mark the URL currently playing; it is exempt from eviction.
    pub fn set_active(&self, url: Option<&str>) {
        self.shared.write().set_active(url.map(str::to_string));
    }

    pub fn active(&self) -> Option<String> {
        self.shared.read().active_url().map(str::to_string)
    }

    /// Start the internal monitor. No-op if already running.
    pub fn start_monitoring(&self) -> bool {
        self.monitor.start()
    }

    /// Stop the internal monitor, waiting for the in-flight tick.
    pub async fn stop_monitoring(&self) {
        self.monitor.stop().await;
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_running()
    }

    /// Probe every candidate now and apply the result.
    pub async fn refresh(&self) -> Arc<MetricsTable> {
        self.monitor.tick_once().await
    }

    /// Latest complete metrics table from the monitor.
    pub fn snapshot(&self) -> Arc<MetricsTable> {
        self.monitor.snapshot()
    }
}

impl PoolShared {
    fn read(&self) -> RwLockReadGuard<'_, PoolState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("RwLock poisoned reading pool state, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, PoolState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("RwLock poisoned writing pool state, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn emit(&self, event: PoolEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn admitted(&self, url: &str) {
        self.tracker.track(url);
        tracing::info!(url = %url, "Candidate added");
        self.emit(PoolEvent::Added {
            url: url.to_string(),
        });
    }

    /// Fold one monitor tick into the ranked table.
    fn apply_tick(&self, table: &MetricsTable) {
        let (evicted, live, healthy, total, best) = {
            let mut state = self.write();
            let evicted = state.apply_tick(table, self.config.max_consecutive_failures);
            let best = state
                .best(None)
                .map(|c| (c.url().to_string(), c.rank_key()));
            let healthy = state
                .candidates()
                .iter()
                .filter_map(CandidateStream::latest_metrics)
                .filter(|m| m.is_healthy(&self.thresholds, self.config.max_consecutive_failures))
                .count();
            (evicted, state.live_count(), healthy, state.len(), best)
        };

        for candidate in &evicted {
            self.tracker.untrack(candidate.url());
            metrics::counter!("streamfox_evictions_total").increment(1);
            tracing::warn!(
                url = %candidate.url(),
                failures = candidate.consecutive_failures(),
                "Candidate evicted after consecutive probe failures"
            );
            self.emit(PoolEvent::Evicted {
                url: candidate.url().to_string(),
                reason: EvictionReason::Exhausted {
                    failures: candidate.consecutive_failures(),
                },
            });
        }

        metrics::gauge!("streamfox_pool_candidates").set(total as f64);
        metrics::gauge!("streamfox_pool_live_candidates").set(live as f64);

        let target = self.thresholds.min_pool_size;
        if live < target {
            if live == 0 {
                tracing::warn!(total, target, "Pool exhausted, no live candidates");
            } else {
                tracing::debug!(live, target, "Pool below target size");
            }
            self.emit(PoolEvent::NeedsCandidates { live, target });
        }

        tracing::debug!(
            tick = table.tick(),
            live,
            healthy,
            total,
            best = ?best,
            "Pool ranking updated"
        );
        self.emit(PoolEvent::Updated {
            tick: table.tick(),
            live,
            best,
        });
    }
}

impl QualityObserver for PoolShared {
    fn on_quality_change(&self, table: &MetricsTable) -> Result<(), ObserverError> {
        self.apply_tick(table);
        Ok(())
    }
}

/// Trim and validate a stream URL, returning its canonical form.
fn normalize(url: &str) -> Result<String, PoolError> {
    let trimmed = url.trim();
    url::Url::parse(trimmed)
        .map(|parsed| parsed.to_string())
        .map_err(|e| PoolError::InvalidUrl {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })
}
