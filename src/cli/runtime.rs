//! Shared wiring for the long-running commands

use crate::cli::{ConfigArgs, SourceArgs};
use crate::config::{MetricsConfig, StreamfoxConfig};
use crate::discovery::{HttpCrawler, StreamDiscovery};
use crate::pool::StreamPool;
use crate::probe::{FfmpegCapture, HttpProbe, QualityProbe};
use crate::quality::QualityScorer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Load configuration: file (if present), then env overrides, then CLI flags.
pub fn load_config(args: &ConfigArgs) -> Result<StreamfoxConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        StreamfoxConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        StreamfoxConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Apply pool source flags on top of the loaded configuration.
pub fn apply_sources(config: &mut StreamfoxConfig, sources: &SourceArgs) {
    config.streams.extend(sources.urls.iter().cloned());
    config.seeds.extend(sources.seeds.iter().cloned());
    if let Some(interval) = sources.interval {
        config.quality.quality_check_interval_seconds = interval;
    }
    if sources.no_discovery {
        config.seeds.clear();
    }
}

/// Probe measuring HTTP latency and sampling frames through ffmpeg.
pub fn build_probe(config: &StreamfoxConfig) -> Result<Arc<dyn QualityProbe>, Box<dyn std::error::Error>> {
    let capture = FfmpegCapture::new(
        config.probe.ffmpeg_path.clone(),
        config.probe.capture_width,
        config.probe.capture_height,
    );
    let scorer = QualityScorer::new(config.quality.clone(), config.scoring.clone());
    let probe = HttpProbe::new(scorer, config.probe.clone(), Arc::new(capture))?;
    Ok(Arc::new(probe))
}

pub fn build_pool(
    config: &StreamfoxConfig,
    probe: Arc<dyn QualityProbe>,
) -> Result<Arc<StreamPool>, Box<dyn std::error::Error>> {
    let pool = StreamPool::new(probe, config.quality.clone(), config.pool.clone())?;
    Ok(Arc::new(pool))
}

pub fn build_crawler(config: &StreamfoxConfig) -> Result<Arc<dyn StreamDiscovery>, Box<dyn std::error::Error>> {
    Ok(Arc::new(HttpCrawler::new(config.crawler.clone())?))
}

/// Add configured streams, then crawl the seeds. Returns the pool size.
pub async fn populate_pool(
    pool: &StreamPool,
    config: &StreamfoxConfig,
    discovery: Option<&dyn StreamDiscovery>,
) -> usize {
    for url in &config.streams {
        if let Err(e) = pool.add(url).await {
            tracing::warn!(url = %url, error = %e, "Skipping stream");
        }
    }

    if let Some(discovery) = discovery {
        for seed in &config.seeds {
            match discovery.discover(seed, config.crawler.max_depth).await {
                Ok(urls) => {
                    let found = urls.len();
                    let added = pool.add_discovered(urls).await;
                    tracing::info!(seed = %seed, found, added, "Crawled seed page");
                }
                Err(e) => tracing::warn!(seed = %seed, error = %e, "Seed crawl failed"),
            }
        }
    }

    pool.len()
}

/// Install the Prometheus exporter when enabled.
pub fn install_metrics_exporter(config: &MetricsConfig) -> Result<(), Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config.listen_addr.parse()?;
    let latency_buckets = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0];

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("streamfox_probe_latency_seconds".to_string()),
            latency_buckets,
        )?
        .install()?;

    tracing::info!(addr = %addr, "Prometheus exporter listening");
    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM), then cancel `cancel_token`.
pub async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn config_args(path: PathBuf) -> ConfigArgs {
        ConfigArgs {
            config: path,
            log_level: None,
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "streams = [\"http://a/live.m3u8\"]\n[pool]\nmax_pool_size = 4").unwrap();

        let config = load_config(&config_args(temp.path().to_path_buf())).unwrap();
        assert_eq!(config.streams, vec!["http://a/live.m3u8"]);
        assert_eq!(config.pool.max_pool_size, 4);
    }

    #[test]
    fn test_load_config_without_file_uses_defaults() {
        let config = load_config(&config_args(PathBuf::from("/nonexistent/streamfox.toml"))).unwrap();
        assert_eq!(config.pool.max_pool_size, 10);
    }

    #[test]
    fn test_cli_log_level_overrides_file() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[logging]\nlevel = \"warn\"").unwrap();

        let args = ConfigArgs {
            config: temp.path().to_path_buf(),
            log_level: Some("trace".to_string()),
        };
        assert_eq!(load_config(&args).unwrap().logging.level, "trace");
    }

    #[test]
    fn test_apply_sources() {
        let mut config = StreamfoxConfig {
            streams: vec!["http://a/1.m3u8".to_string()],
            seeds: vec!["http://site/".to_string()],
            ..Default::default()
        };
        let sources = SourceArgs {
            urls: vec!["http://a/2.m3u8".to_string()],
            interval: Some(3.0),
            no_discovery: true,
            ..Default::default()
        };

        apply_sources(&mut config, &sources);
        assert_eq!(config.streams.len(), 2);
        assert!(config.seeds.is_empty());
        assert_eq!(config.quality.quality_check_interval_seconds, 3.0);
    }

    #[tokio::test]
    async fn test_populate_pool_skips_invalid_streams() {
        let config = StreamfoxConfig {
            streams: vec![
                "http://a/1.m3u8".to_string(),
                "not a url".to_string(),
                "http://a/1.m3u8".to_string(),
            ],
            ..Default::default()
        };
        let probe = build_probe(&config).unwrap();
        let pool = build_pool(&config, probe).unwrap();

        assert_eq!(populate_pool(&pool, &config, None).await, 1);
    }

    #[test]
    fn test_metrics_exporter_disabled_is_noop() {
        assert!(install_metrics_exporter(&MetricsConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_signal_returns_on_cancel() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(2), shutdown_signal(cancel)).await;
        assert!(result.is_ok());
    }
}
