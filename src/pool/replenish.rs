//! Background pool replenishment.

use super::{PoolEvent, StreamPool};
use crate::discovery::StreamDiscovery;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Feeds the pool from the crawling collaborator whenever it reports
/// [`PoolEvent::NeedsCandidates`], at most once per cooldown.
pub struct Replenisher {
    pool: Arc<StreamPool>,
    discovery: Arc<dyn StreamDiscovery>,
    seeds: Vec<String>,
    max_depth: u32,
    cooldown: Duration,
}

impl Replenisher {
    pub fn new(
        pool: Arc<StreamPool>,
        discovery: Arc<dyn StreamDiscovery>,
        seeds: Vec<String>,
        max_depth: u32,
    ) -> Self {
        let cooldown = pool.config().replenish_cooldown();
        Self {
            pool,
            discovery,
            seeds,
            max_depth,
            cooldown,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Crawl every seed once and add what was found. Returns the number of
    /// URLs inserted. Crawl failures are logged and skipped.
    pub async fn run_once(&self) -> usize {
        let mut inserted = 0;
        for seed in &self.seeds {
            match self.discovery.discover(seed, self.max_depth).await {
                Ok(urls) => {
                    let found = urls.len();
                    let added = self.pool.add_discovered(urls).await;
                    tracing::info!(seed = %seed, found, added, "Replenished pool");
                    inserted += added;
                }
                Err(e) => {
                    tracing::warn!(seed = %seed, error = %e, "Replenishment crawl failed");
                }
            }
        }
        inserted
    }

    /// Start the replenisher background task.
    /// Returns a JoinHandle that resolves when the replenisher stops.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        let mut events = self.pool.subscribe();
        tokio::spawn(async move {
            if self.seeds.is_empty() {
                tracing::debug!("No seeds configured, replenisher idle");
            }
            let mut last_run: Option<Instant> = None;

            loop {
                let event = tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::debug!("Replenisher shutting down");
                        break;
                    }
                    event = events.recv() => event,
                };

                match event {
                    Ok(PoolEvent::NeedsCandidates { live, target }) => {
                        if self.seeds.is_empty() {
                            continue;
                        }
                        if last_run.is_some_and(|at| at.elapsed() < self.cooldown) {
                            tracing::debug!(live, target, "Replenishment cooling down");
                            continue;
                        }
                        last_run = Some(Instant::now());
                        self.run_once().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Replenisher lagged behind pool events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
