//! Playback failover.
//!
//! The [`FailoverController`] compares the active stream's score with the
//! pool's best candidate after every monitor tick and drives the player
//! executor through a `Playing -> Switching -> Playing` transition when the
//! candidate leads by at least the switch threshold. A failed start rolls
//! back to the previous stream, then walks the remaining live candidates,
//! and only stops playback once nothing can be started.

mod error;
mod events;
mod executor;
mod state;


pub use error::{FailoverError, PlayerError};
pub use events::{PlaybackEvent, StopReason};
pub use executor::{PlayerExecutor, PlayerHandle};
pub use state::{decide_switch, PlaybackState, SwitchDecision};

use crate::pool::{PoolEvent, StreamPool};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of the playback event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Result of one switch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Now playing `to`
    Switched { from: String, to: String },
    /// Same URL restarted after its player died
    Restarted { url: String },
    /// `failed` did not start; back on `from`
    RolledBack { from: String, failed: String },
    /// Target and rollback failed; playing the next live candidate
    FellBack { failed: Vec<String>, to: String },
    /// Nothing could be started; the session stopped
    Exhausted { tried: Vec<String> },
    /// Another switch was already in flight
    Rejected,
    /// Target is already playing
    Unchanged,
}

/// Drives switching for one playback session.
pub struct FailoverController {
    pool: Arc<StreamPool>,
    executor: Arc<dyn PlayerExecutor>,
    switch_threshold: f64,
    exhaustion_timeout: Option<Duration>,
    state: RwLock<PlaybackState>,
    handle: Mutex<Option<PlayerHandle>>,
    exhausted_since: Mutex<Option<Instant>>,
    /// Serializes tick evaluations
    evaluating: tokio::sync::Mutex<()>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl FailoverController {
    /// Start playback and return the controller in `Playing`.
    ///
    /// Plays `initial_url`, or the pool's best candidate when `None`. The
    /// initial URL is added to the pool so it is monitored. If it fails to
    /// start, the remaining live candidates are tried in rank order.
    ///
    /// # Errors
    ///
    /// `NoCandidate` without any URL to play, `Exhausted` when nothing
    /// starts, `Pool` when the initial URL is invalid.
    pub async fn launch(
        pool: Arc<StreamPool>,
        executor: Arc<dyn PlayerExecutor>,
        initial_url: Option<&str>,
        exhaustion_timeout: Option<Duration>,
    ) -> Result<Self, FailoverError> {
        let initial = match initial_url {
            Some(url) => Some(url.to_string()),
            None => pool.best(),
        };
        let Some(initial) = initial else {
            return Err(FailoverError::NoCandidate);
        };
        if !pool.contains(&initial) {
            pool.add(&initial).await?;
        }

        let mut order = vec![initial.clone()];
        order.extend(
            pool.live_ranked()
                .into_iter()
                .map(|(url, _)| url)
                .filter(|url| *url != initial),
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let switch_threshold = pool.thresholds().switch_threshold_score;
        let controller = Self {
            pool,
            executor,
            switch_threshold,
            exhaustion_timeout,
            state: RwLock::new(PlaybackState::Stopped),
            handle: Mutex::new(None),
            exhausted_since: Mutex::new(None),
            evaluating: tokio::sync::Mutex::new(()),
            events,
        };

        let mut tried = Vec::new();
        for url in order {
            match controller.executor.start(&url).await {
                Ok(handle) => {
                    controller.set_state(PlaybackState::Playing { url: url.clone() });
                    *controller.lock_handle() = Some(handle);
                    controller.pool.set_active(Some(&url));
                    tracing::info!(url = %url, "Playback started");
                    controller.emit(PlaybackEvent::Started { url });
                    return Ok(controller);
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Stream failed to start");
                    tried.push(url);
                }
            }
        }

        tracing::error!(tried = tried.len(), "No stream could be started");
        Err(FailoverError::Exhausted { tried })
    }

    /// Subscribe to playback events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// URL of the stream currently playing.
    pub fn active_url(&self) -> Option<String> {
        self.state().active_url().map(str::to_string)
    }

    pub fn switch_threshold(&self) -> f64 {
        self.switch_threshold
    }

    /// Compare the active stream against the pool and act on it.
    ///
    /// Called once per monitor tick. A dead player triggers immediate
    /// failover without hysteresis; otherwise a switch happens only when
    /// [`decide_switch`] says so. Returns the switch outcome if one was
    /// attempted.
    pub async fn evaluate(&self) -> Option<SwitchOutcome> {
        let _evaluating = self.evaluating.lock().await;

        let PlaybackState::Playing { url: active } = self.state() else {
            return None;
        };

        let handle = self.lock_handle().clone();
        if let Some(handle) = handle {
            if !self.executor.is_running(&handle).await {
                return Some(self.recover_dead_player(active).await);
            }
        }

        let best = self.pool.best_with_score();
        if best.is_none() {
            if self.exhaustion_expired() {
                tracing::error!(
                    url = %active,
                    "Pool stayed exhausted past timeout, stopping playback"
                );
                self.stop_with(StopReason::ExhaustionTimeout).await;
            }
            return None;
        }
        *self.lock_exhausted_since() = None;

        let decision = decide_switch(
            &active,
            self.pool.score_of(&active),
            best.as_ref().map(|(url, score)| (url.as_str(), *score)),
            self.switch_threshold,
        );
        match decision {
            SwitchDecision::Stay => None,
            SwitchDecision::Switch { to, delta } => {
                tracing::info!(from = %active, to = %to, delta, "Better stream available");
                match self.switch_to(&to).await {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        tracing::debug!(error = %e, "Switch abandoned");
                        None
                    }
                }
            }
        }
    }

    /// Switch playback to `to`.
    ///
    /// Only one switch may be in flight; a second request while `Switching`
    /// returns [`SwitchOutcome::Rejected`] without touching the executor.
    ///
    /// # Errors
    ///
    /// Returns `FailoverError::Stopped` if the session is stopped.
    pub async fn switch_to(&self, to: &str) -> Result<SwitchOutcome, FailoverError> {
        let from = {
            let mut state = self.write_state();
            match &*state {
                PlaybackState::Playing { url } if url == to => {
                    return Ok(SwitchOutcome::Unchanged);
                }
                PlaybackState::Playing { url } => {
                    let from = url.clone();
                    *state = PlaybackState::Switching {
                        from: from.clone(),
                        to: to.to_string(),
                    };
                    from
                }
                PlaybackState::Switching { from, to: pending } => {
                    tracing::debug!(
                        from = %from,
                        pending = %pending,
                        requested = %to,
                        "Switch already in flight, rejecting"
                    );
                    return Ok(SwitchOutcome::Rejected);
                }
                PlaybackState::Stopped => return Err(FailoverError::Stopped),
            }
        };

        tracing::info!(from = %from, to = %to, "Switching stream");
        self.emit(PlaybackEvent::SwitchStarted {
            from: from.clone(),
            to: to.to_string(),
        });
        self.perform_switch(&from, to).await
    }

    /// Stop playback. The session ends in `Stopped`.
    pub async fn stop(&self) {
        self.stop_with(StopReason::Requested).await;
    }

    /// Evaluate after every pool update until stopped or cancelled.
    /// Returns a JoinHandle that resolves when the controller stops.
    pub fn run(self: Arc<Self>, cancel_token: CancellationToken) -> JoinHandle<()> {
        let mut updates = self.pool.subscribe();
        tokio::spawn(async move {
            tracing::info!(
                switch_threshold = self.switch_threshold,
                "Failover controller started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        self.stop().await;
                        break;
                    }
                    event = updates.recv() => {
                        match event {
                            Ok(PoolEvent::Updated { .. }) => {
                                self.evaluate().await;
                            }
                            Ok(_) => continue,
                            Err(RecvError::Lagged(skipped)) => {
                                tracing::debug!(skipped, "Controller lagged behind pool events");
                                self.evaluate().await;
                            }
                            Err(RecvError::Closed) => break,
                        }
                        if self.state().is_stopped() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Failover controller stopped");
        })
    }

    async fn perform_switch(&self, from: &str, to: &str) -> Result<SwitchOutcome, FailoverError> {
        let old = self.lock_handle().take();
        if let Some(old) = old {
            if let Err(e) = self.executor.stop(&old).await {
                tracing::warn!(url = %from, error = %e, "Failed to stop previous player");
            }
        }

        match self.executor.start(to).await {
            Ok(handle) => {
                self.commit(to, handle).await?;
                if from == to {
                    metrics::counter!("streamfox_switches_total", "outcome" => "restarted")
                        .increment(1);
                    tracing::info!(url = %to, "Player restarted");
                    return Ok(SwitchOutcome::Restarted {
                        url: to.to_string(),
                    });
                }
                metrics::counter!("streamfox_switches_total", "outcome" => "completed")
                    .increment(1);
                tracing::info!(from = %from, to = %to, "Switch completed");
                self.emit(PlaybackEvent::SwitchCompleted {
                    from: from.to_string(),
                    to: to.to_string(),
                });
                return Ok(SwitchOutcome::Switched {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(url = %to, error = %e, "New stream failed to start");
            }
        }

        if from != to {
            match self.executor.start(from).await {
                Ok(handle) => {
                    self.commit(from, handle).await?;
                    metrics::counter!("streamfox_switches_total", "outcome" => "rolled_back")
                        .increment(1);
                    tracing::warn!(from = %from, failed = %to, "Switch rolled back");
                    self.emit(PlaybackEvent::RolledBack {
                        from: from.to_string(),
                        failed: to.to_string(),
                    });
                    return Ok(SwitchOutcome::RolledBack {
                        from: from.to_string(),
                        failed: to.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %from, error = %e, "Rollback failed");
                }
            }
        }

        let mut failed = vec![to.to_string()];
        if from != to {
            failed.push(from.to_string());
        }
        self.fall_back(failed).await
    }

    /// Walk the remaining live candidates in rank order.
    async fn fall_back(&self, mut failed: Vec<String>) -> Result<SwitchOutcome, FailoverError> {
        for (url, _) in self.pool.live_ranked() {
            if failed.contains(&url) {
                continue;
            }
            match self.executor.start(&url).await {
                Ok(handle) => {
                    self.commit(&url, handle).await?;
                    metrics::counter!("streamfox_switches_total", "outcome" => "fell_back")
                        .increment(1);
                    tracing::warn!(to = %url, failed = ?failed, "Fell back to next candidate");
                    self.emit(PlaybackEvent::FellBack {
                        failed: failed.clone(),
                        to: url.clone(),
                    });
                    return Ok(SwitchOutcome::FellBack { failed, to: url });
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Fallback candidate failed to start");
                    failed.push(url);
                }
            }
        }

        metrics::counter!("streamfox_switches_total", "outcome" => "exhausted").increment(1);
        tracing::error!(tried = ?failed, "Every candidate failed to start, stopping playback");
        self.stop_with(StopReason::Exhausted).await;
        Ok(SwitchOutcome::Exhausted { tried: failed })
    }

    async fn recover_dead_player(&self, active: String) -> SwitchOutcome {
        tracing::warn!(url = %active, "Player exited, failing over");
        self.emit(PlaybackEvent::PlayerExited { url: active.clone() });

        let target = self
            .pool
            .best_excluding(Some(&active))
            .map(|(url, _)| url)
            .unwrap_or_else(|| active.clone());

        {
            let mut state = self.write_state();
            if !matches!(&*state, PlaybackState::Playing { url } if *url == active) {
                return SwitchOutcome::Rejected;
            }
            *state = PlaybackState::Switching {
                from: active.clone(),
                to: target.clone(),
            };
        }
        if target != active {
            self.emit(PlaybackEvent::SwitchStarted {
                from: active.clone(),
                to: target.clone(),
            });
        }

        match self.perform_switch(&active, &target).await {
            Ok(outcome) => outcome,
            // Stopped while recovering
            Err(_) => SwitchOutcome::Exhausted { tried: vec![] },
        }
    }

    /// Make `url` the active stream, unless the session was stopped meanwhile.
    async fn commit(&self, url: &str, handle: PlayerHandle) -> Result<(), FailoverError> {
        let committed = {
            let mut state = self.write_state();
            if state.is_stopped() {
                false
            } else {
                *state = PlaybackState::Playing {
                    url: url.to_string(),
                };
                true
            }
        };

        if !committed {
            if let Err(e) = self.executor.stop(&handle).await {
                tracing::warn!(url = %url, error = %e, "Failed to stop player after session ended");
            }
            return Err(FailoverError::Stopped);
        }

        *self.lock_handle() = Some(handle);
        self.pool.set_active(Some(url));
        Ok(())
    }

    async fn stop_with(&self, reason: StopReason) {
        {
            let mut state = self.write_state();
            if state.is_stopped() {
                return;
            }
            *state = PlaybackState::Stopped;
        }

        let handle = self.lock_handle().take();
        if let Some(handle) = handle {
            if let Err(e) = self.executor.stop(&handle).await {
                tracing::warn!(url = %handle.url(), error = %e, "Failed to stop player");
            }
        }
        self.pool.set_active(None);

        match reason {
            StopReason::Requested => tracing::info!("Playback stopped"),
            _ => tracing::warn!(reason = ?reason, "Playback stopped"),
        }
        self.emit(PlaybackEvent::Stopped { reason });
    }

    /// Track how long the pool has had no live candidate.
    fn exhaustion_expired(&self) -> bool {
        let Some(timeout) = self.exhaustion_timeout else {
            return false;
        };
        let mut since = self.lock_exhausted_since();
        let started = *since.get_or_insert_with(Instant::now);
        started.elapsed() >= timeout
    }

    fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.send(event);
    }

    fn set_state(&self, next: PlaybackState) {
        *self.write_state() = next;
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, PlaybackState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("RwLock poisoned in failover state, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<PlayerHandle>> {
        match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_exhausted_since(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        match self.exhausted_since.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
