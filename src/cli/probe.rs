//! Probe command implementation

use crate::cli::output::{format_probe_json, format_probe_pretty};
use crate::cli::runtime::{build_probe, load_config};
use crate::cli::ProbeArgs;
use crate::logging::init_tracing;
use crate::probe::QualityProbe;

/// Probe `url` once and format the result.
pub async fn handle_probe(
    probe: &dyn QualityProbe,
    url: &str,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let metrics = match tokio::time::timeout(probe.timeout(), probe.probe(url, 0)).await {
        Ok(metrics) => metrics,
        Err(_) => crate::quality::QualityMetrics::unreachable(url, 1),
    };

    if json {
        Ok(format_probe_json(&metrics)?)
    } else {
        Ok(format_probe_pretty(&metrics))
    }
}

/// Handle `streamfox probe` command
pub async fn run_probe(args: ProbeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let probe = build_probe(&config)?;
    let output = handle_probe(probe.as_ref(), &args.url, args.json).await?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{ProbeSample, QualityMetrics};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    struct FixedProbe;

    #[async_trait]
    impl QualityProbe for FixedProbe {
        async fn probe(&self, url: &str, _prior_errors: u32) -> QualityMetrics {
            let sample = ProbeSample {
                url: url.to_string(),
                latency_ms: 300.0,
                fps: 25.0,
                is_buffering: false,
                is_active: true,
                error_count: 0,
                timestamp: Utc::now(),
            };
            QualityMetrics::with_score(sample, 0.87)
        }
    }

    struct HangingProbe;

    #[async_trait]
    impl QualityProbe for HangingProbe {
        async fn probe(&self, url: &str, _prior_errors: u32) -> QualityMetrics {
            tokio::time::sleep(Duration::from_secs(30)).await;
            QualityMetrics::unreachable(url, 0)
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }
    }

    #[tokio::test]
    async fn test_handle_probe_pretty() {
        let output = handle_probe(&FixedProbe, "http://a/live.m3u8", false).await.unwrap();
        assert!(output.contains("http://a/live.m3u8"));
        assert!(output.contains("0.870"));
        assert!(output.contains("300ms"));
    }

    #[tokio::test]
    async fn test_handle_probe_json() {
        let output = handle_probe(&FixedProbe, "http://a/live.m3u8", true).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["fps"], 25.0);
    }

    #[tokio::test]
    async fn test_handle_probe_timeout_reports_unreachable() {
        let output = handle_probe(&HangingProbe, "http://a/live.m3u8", false).await.unwrap();
        assert!(output.contains("unreachable"));
    }
}
