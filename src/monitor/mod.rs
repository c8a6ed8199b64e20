//! Concurrent periodic stream monitoring.
//!
//! [`AsyncStreamMonitor`] probes every tracked URL once per tick, all probes
//! of a tick running concurrently, and publishes a complete [`MetricsTable`]
//! only after every probe of the tick has finished or timed out.

mod observer;
mod table;
mod tracker;


pub use observer::{ObserverError, QualityObserver};
pub use table::MetricsTable;
pub use tracker::UrlTracker;

use crate::probe::QualityProbe;
use crate::quality::QualityMetrics;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Largest safety margin kept free at the end of each tick.
const MAX_TICK_MARGIN: Duration = Duration::from_secs(1);

/// Runs a [`QualityProbe`] over all tracked URLs on a fixed interval.
pub struct AsyncStreamMonitor {
    inner: Arc<MonitorInner>,
    running: Mutex<Option<RunningLoop>>,
}

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct MonitorInner {
    probe: Arc<dyn QualityProbe>,
    interval: Duration,
    tracker: Arc<UrlTracker>,
    table: RwLock<Arc<MetricsTable>>,
    observers: RwLock<Vec<Arc<dyn QualityObserver>>>,
    ticks: AtomicU64,
    /// Serializes ticks so each table has a single writer
    tick_lock: tokio::sync::Mutex<()>,
}

impl AsyncStreamMonitor {
    /// Create a stopped monitor ticking every `interval`.
    pub fn new(probe: Arc<dyn QualityProbe>, interval: Duration) -> Self {
        Self::with_tracker(probe, interval, Arc::new(UrlTracker::new()))
    }

    /// Create a monitor over a tracker shared with its owner.
    pub fn with_tracker(
        probe: Arc<dyn QualityProbe>,
        interval: Duration,
        tracker: Arc<UrlTracker>,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                probe,
                interval,
                tracker,
                table: RwLock::new(Arc::new(MetricsTable::default())),
                observers: RwLock::new(Vec::new()),
                ticks: AtomicU64::new(0),
                tick_lock: tokio::sync::Mutex::new(()),
            }),
            running: Mutex::new(None),
        }
    }

    /// Track `url` from the next tick on. Returns false if already tracked.
    pub fn track(&self, url: &str) -> bool {
        self.inner.tracker.track(url)
    }

    /// Stop probing `url`. Its metrics disappear from the next table.
    pub fn untrack(&self, url: &str) -> bool {
        self.inner.tracker.untrack(url)
    }

    /// Tracked URLs in insertion order.
    pub fn tracked(&self) -> Vec<String> {
        self.inner.tracker.snapshot()
    }

    /// Register an observer called once after every completed tick.
    pub fn register_observer(&self, observer: Arc<dyn QualityObserver>) {
        match self.inner.observers.write() {
            Ok(mut observers) => observers.push(observer),
            Err(poisoned) => {
                tracing::warn!("RwLock poisoned in register_observer, recovering");
                poisoned.into_inner().push(observer);
            }
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Wall-clock ceiling for one tick: the interval minus a safety margin.
    pub fn tick_budget(&self) -> Duration {
        self.inner.tick_budget()
    }

    /// Latest complete metrics table. Never blocks on an in-flight tick.
    pub fn snapshot(&self) -> Arc<MetricsTable> {
        self.inner.current()
    }

    /// Run one tick immediately and return its table.
    ///
    /// Serialized with the background loop, so a manual tick never overlaps
    /// a scheduled one.
    pub async fn tick_once(&self) -> Arc<MetricsTable> {
        self.inner.run_tick().await
    }

    pub fn is_running(&self) -> bool {
        self.lock_running()
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Start the background loop. Returns false if it was already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.lock_running();
        if running
            .as_ref()
            .is_some_and(|existing| !existing.handle.is_finished())
        {
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = Arc::clone(&self.inner).spawn_loop(cancel.clone());
        *running = Some(RunningLoop { cancel, handle });
        true
    }

    /// Stop the background loop.
    ///
    /// Waits for the in-flight tick, if any, to finish or time out; no probe
    /// is left running once this returns. No-op when not running.
    pub async fn stop(&self) {
        let running = self.lock_running().take();
        let Some(running) = running else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            tracing::warn!(error = %e, "Stream monitor task ended abnormally");
        }
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, Option<RunningLoop>> {
        match self.running.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Mutex poisoned in stream monitor, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Drop for AsyncStreamMonitor {
    fn drop(&mut self) {
        if let Some(running) = self.lock_running().take() {
            running.cancel.cancel();
        }
    }
}

impl MonitorInner {
    fn tick_budget(&self) -> Duration {
        let margin = (self.interval / 10).min(MAX_TICK_MARGIN);
        self.interval
            .saturating_sub(margin)
            .max(Duration::from_millis(1))
    }

    fn current(&self) -> Arc<MetricsTable> {
        match self.table.read() {
            Ok(table) => Arc::clone(&table),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish(&self, table: Arc<MetricsTable>) {
        match self.table.write() {
            Ok(mut current) => *current = table,
            Err(poisoned) => {
                tracing::warn!("RwLock poisoned publishing metrics table, recovering");
                *poisoned.into_inner() = table;
            }
        }
    }

    fn observers(&self) -> Vec<Arc<dyn QualityObserver>> {
        match self.observers.read() {
            Ok(observers) => observers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn run_tick(&self) -> Arc<MetricsTable> {
        let _tick = self.tick_lock.lock().await;
        let started = Instant::now();

        let urls = self.tracker.begin_tick();
        let previous = self.current();
        let timeout = self.probe.timeout().min(self.tick_budget());

        let probes = urls.iter().map(|(url, fresh)| {
            let prior_errors = if *fresh { 0 } else { previous.error_count(url) };
            let probe = &self.probe;
            async move {
                let metrics = match tokio::time::timeout(timeout, probe.probe(url, prior_errors))
                    .await
                {
                    Ok(metrics) => metrics,
                    Err(_) => {
                        tracing::debug!(
                            url = %url,
                            timeout_ms = timeout.as_millis() as u64,
                            "Probe timed out"
                        );
                        QualityMetrics::unreachable(url.as_str(), prior_errors.saturating_add(1))
                    }
                };
                (url.clone(), metrics)
            }
        });
        let results = futures::future::join_all(probes).await;

        // URLs untracked while the tick was running are dropped
        let tracked = self.tracker.snapshot();
        let metrics: HashMap<String, QualityMetrics> = results
            .into_iter()
            .filter(|(url, _)| tracked.contains(url))
            .collect();

        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        let table = Arc::new(MetricsTable::new(tick, metrics));
        self.publish(Arc::clone(&table));

        tracing::debug!(
            tick,
            urls_probed = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Monitor tick completed"
        );

        for observer in self.observers() {
            observer::notify(observer.as_ref(), &table);
        }

        table
    }

    fn spawn_loop(self: Arc<Self>, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_ms = self.interval.as_millis() as u64,
                tracked = self.tracker.len(),
                "Stream monitor started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Stream monitor shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.run_tick().await;
                    }
                }
            }
        })
    }
}
