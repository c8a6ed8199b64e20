//! Shared test utilities for Streamfox integration tests.
//!
//! Scripted in-memory doubles for the probe, frame capture, player and
//! crawling collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use streamfox::discovery::{DiscoveryError, StreamDiscovery};
use streamfox::failover::{PlayerError, PlayerExecutor, PlayerHandle};
use streamfox::pool::{PoolConfig, StreamPool};
use streamfox::probe::{CaptureError, Frame, FrameCapture, QualityProbe};
use streamfox::quality::{ProbeSample, QualityMetrics, QualityThresholds};

// =============================================================================
// URLs
// =============================================================================

pub fn stream_url(n: usize) -> String {
    format!("https://mirror{n}.example.com/live/index.m3u8")
}

// =============================================================================
// Probe
// =============================================================================

/// Probe whose per-URL score is set by the test. URLs without a score fail.
#[derive(Default)]
pub struct ScriptedProbe {
    scores: Mutex<HashMap<String, f64>>,
}

impl ScriptedProbe {
    pub fn set(&self, url: &str, score: f64) {
        self.scores.lock().unwrap().insert(url.to_string(), score);
    }

    pub fn fail(&self, url: &str) {
        self.scores.lock().unwrap().remove(url);
    }
}

#[async_trait]
impl QualityProbe for ScriptedProbe {
    async fn probe(&self, url: &str, prior_errors: u32) -> QualityMetrics {
        let score = self.scores.lock().unwrap().get(url).copied();
        match score {
            Some(score) => QualityMetrics::with_score(healthy_sample(url), score),
            None => QualityMetrics::unreachable(url, prior_errors + 1),
        }
    }
}

pub fn healthy_sample(url: &str) -> ProbeSample {
    ProbeSample {
        url: url.to_string(),
        latency_ms: 400.0,
        fps: 25.0,
        is_buffering: false,
        is_active: true,
        error_count: 0,
        timestamp: Utc::now(),
    }
}

/// Pool over a scripted probe with `min_pool_size` and default limits.
pub fn scripted_pool(probe: &Arc<ScriptedProbe>, min_pool_size: usize) -> Arc<StreamPool> {
    Arc::new(
        StreamPool::new(
            Arc::clone(probe) as Arc<dyn QualityProbe>,
            QualityThresholds {
                min_pool_size,
                ..Default::default()
            },
            PoolConfig::default(),
        )
        .unwrap(),
    )
}

// =============================================================================
// Frame capture
// =============================================================================

/// Capture double returning a fixed frame sequence or error.
pub struct ScriptedCapture(pub Result<Vec<Frame>, CaptureError>);

#[async_trait]
impl FrameCapture for ScriptedCapture {
    async fn sample_frames(&self, _url: &str, _window: Duration) -> Result<Vec<Frame>, CaptureError> {
        self.0.clone()
    }
}

/// `count` frames whose content changes every frame.
pub fn moving_frames(count: usize) -> Vec<Frame> {
    (0..count).map(|i| Frame::filled(8, 8, (i * 7 % 256) as u8)).collect()
}

/// `count` identical frames.
pub fn frozen_frames(count: usize) -> Vec<Frame> {
    vec![Frame::filled(8, 8, 128); count]
}

// =============================================================================
// Player
// =============================================================================

/// Executor double recording `start <url>` / `stop <url>` calls.
#[derive(Default)]
pub struct ScriptedExecutor {
    failing: Mutex<HashSet<String>>,
    dead: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn kill(&self, url: &str) {
        self.dead.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn starts(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("start ")).count()
    }
}

#[async_trait]
impl PlayerExecutor for ScriptedExecutor {
    async fn start(&self, url: &str) -> Result<PlayerHandle, PlayerError> {
        self.calls.lock().unwrap().push(format!("start {url}"));
        if self.failing.lock().unwrap().contains(url) {
            return Err(PlayerError::ExitedDuringStartup {
                url: url.to_string(),
                code: Some(1),
            });
        }
        Ok(PlayerHandle::new(url, None))
    }

    async fn stop(&self, handle: &PlayerHandle) -> Result<(), PlayerError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("stop {}", handle.url()));
        Ok(())
    }

    async fn is_running(&self, handle: &PlayerHandle) -> bool {
        !self.dead.lock().unwrap().contains(handle.url())
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Crawler double returning a fixed URL list for every seed.
#[derive(Default)]
pub struct StubDiscovery {
    pub urls: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubDiscovery {
    pub fn returning(urls: Vec<String>) -> Self {
        Self {
            urls,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StreamDiscovery for StubDiscovery {
    async fn discover(&self, seed_url: &str, _max_depth: u32) -> Result<Vec<String>, DiscoveryError> {
        self.calls.lock().unwrap().push(seed_url.to_string());
        Ok(self.urls.clone())
    }
}
