//! Stream health probing.
//!
//! A probe performs one health measurement of one stream URL: request
//! latency, then a short frame sample for fps, buffering and activity. Probe
//! failures never escape; they come back as degraded metrics snapshots.

mod capture;
mod config;
mod error;
mod frames;


pub use capture::{FfmpegCapture, FrameCapture};
pub use config::ProbeConfig;
pub use error::{CaptureError, ProbeError};
pub use frames::{Frame, FrameAnalysis};

use crate::quality::{ProbeSample, QualityMetrics, QualityScorer};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on the latency request timeout.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(3600);

/// One health measurement of one stream.
#[async_trait]
pub trait QualityProbe: Send + Sync + 'static {
    /// Measure `url`. `prior_errors` is the consecutive failure count from
    /// the previous tick; a failed probe reports `prior_errors + 1`, a
    /// successful one reports 0.
    async fn probe(&self, url: &str, prior_errors: u32) -> QualityMetrics;

    /// Upper bound on a single probe, enforced by the monitor.
    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }
}

/// Probe that times an HTTP GET and samples frames through a capture collaborator.
pub struct HttpProbe {
    client: reqwest::Client,
    capture: Arc<dyn FrameCapture>,
    scorer: QualityScorer,
    config: ProbeConfig,
}

impl HttpProbe {
    /// Create a probe with a default HTTP client.
    pub fn new(
        scorer: QualityScorer,
        config: ProbeConfig,
        capture: Arc<dyn FrameCapture>,
    ) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("streamfox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;
        Ok(Self::with_client(client, scorer, config, capture))
    }

    /// Create a probe with a custom HTTP client (for testing).
    pub fn with_client(
        client: reqwest::Client,
        scorer: QualityScorer,
        config: ProbeConfig,
        capture: Arc<dyn FrameCapture>,
    ) -> Self {
        Self {
            client,
            capture,
            scorer,
            config,
        }
    }

    /// Safety ceiling for the latency request, scaled from `max_latency_ms`
    /// and capped at [`MAX_REQUEST_TIMEOUT`].
    pub fn request_timeout(&self) -> Duration {
        let ms = self.scorer.thresholds().max_latency_ms * self.config.timeout_factor;
        Duration::try_from_secs_f64((ms / 1000.0).max(0.001))
            .unwrap_or(MAX_REQUEST_TIMEOUT)
            .min(MAX_REQUEST_TIMEOUT)
    }

    fn sample_window(&self) -> Duration {
        Duration::from_millis(self.config.sample_window_ms)
    }

    /// Time the response headers of a GET request.
    pub async fn measure_latency(&self, url: &str) -> Result<f64, ProbeError> {
        let timeout = self.request_timeout();
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify_error(e, timeout))?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ProbeError::HttpStatus(status.as_u16()));
        }
        // Body is a live stream; headers are enough
        drop(response);

        Ok(latency_ms)
    }

    /// Sample frames and derive fps, buffering and activity.
    pub async fn sample_activity(&self, url: &str) -> Result<FrameAnalysis, ProbeError> {
        let window = self.sample_window();
        let budget = window.saturating_add(self.request_timeout());

        let frames = tokio::time::timeout(budget, self.capture.sample_frames(url, window))
            .await
            .map_err(|_| CaptureError::Timeout(budget.as_millis() as u64))??;

        Ok(FrameAnalysis::from_frames(
            &frames,
            window,
            Duration::from_millis(self.config.frame_gap_ms),
            self.config.buffering_epsilon,
            self.config.motion_floor,
        ))
    }

    fn classify_error(e: reqwest::Error, timeout: Duration) -> ProbeError {
        if e.is_timeout() {
            ProbeError::Timeout(timeout.as_millis() as u64)
        } else {
            ProbeError::ConnectionFailed(e.to_string())
        }
    }
}

#[async_trait]
impl QualityProbe for HttpProbe {
    async fn probe(&self, url: &str, prior_errors: u32) -> QualityMetrics {
        let failed_count = prior_errors.saturating_add(1);

        let latency_ms = match self.measure_latency(url).await {
            Ok(latency_ms) => latency_ms,
            Err(error) => {
                tracing::debug!(url, error = %error, "Stream unreachable");
                metrics::counter!("streamfox_probes_total", "outcome" => "unreachable").increment(1);
                return QualityMetrics::unreachable(url, failed_count);
            }
        };
        metrics::histogram!("streamfox_probe_latency_seconds").record(latency_ms / 1000.0);

        let sample = match self.sample_activity(url).await {
            Ok(analysis) => {
                metrics::counter!("streamfox_probes_total", "outcome" => "ok").increment(1);
                ProbeSample {
                    url: url.to_string(),
                    latency_ms,
                    fps: analysis.fps,
                    is_buffering: analysis.is_buffering,
                    is_active: analysis.is_active,
                    error_count: 0,
                    timestamp: Utc::now(),
                }
            }
            Err(error) => {
                tracing::debug!(url, error = %error, "Frame sampling failed");
                metrics::counter!("streamfox_probes_total", "outcome" => "capture_failed")
                    .increment(1);
                ProbeSample {
                    url: url.to_string(),
                    latency_ms,
                    fps: 0.0,
                    is_buffering: true,
                    is_active: false,
                    error_count: failed_count,
                    timestamp: Utc::now(),
                }
            }
        };

        let snapshot = self.scorer.evaluate(sample);
        tracing::trace!(
            url,
            score = snapshot.quality_score(),
            latency_ms = snapshot.latency_ms(),
            fps = snapshot.fps(),
            "Probe complete"
        );
        snapshot
    }

    fn timeout(&self) -> Duration {
        // latency request + capture budget (window + request timeout)
        self.request_timeout()
            .saturating_mul(2)
            .saturating_add(self.sample_window())
    }
}
