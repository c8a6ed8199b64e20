//! Configuration module for Streamfox
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`STREAMFOX_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use streamfox::config::StreamfoxConfig;
//!
//! let config = StreamfoxConfig::default();
//! assert_eq!(config.quality.min_pool_size, 3);
//!
//! let toml = r#"
//! streams = ["https://cdn.example.com/live.m3u8"]
//!
//! [quality]
//! switch_threshold_score = 0.2
//! "#;
//! let config: StreamfoxConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.quality.switch_threshold_score, 0.2);
//! assert_eq!(config.quality.max_latency_ms, 3000.0);
//! ```

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use metrics::MetricsConfig;

pub use crate::discovery::CrawlerConfig;
pub use crate::player::PlayerConfig;
pub use crate::pool::PoolConfig;
pub use crate::probe::ProbeConfig;
pub use crate::quality::{QualityThresholds, ScoringPolicy};

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "streamfox.toml";

/// Unified configuration for Streamfox.
///
/// Aggregates the stream sources, quality thresholds, scoring policy, pool,
/// probe, player, crawler, logging and metrics sections.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StreamfoxConfig {
    /// Direct stream URLs added to the pool at startup
    pub streams: Vec<String>,
    /// Pages crawled for stream URLs at startup and on replenishment
    pub seeds: Vec<String>,
    pub quality: QualityThresholds,
    pub scoring: ScoringPolicy,
    pub pool: PoolConfig,
    pub probe: ProbeConfig,
    pub player: PlayerConfig,
    pub crawler: CrawlerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl StreamfoxConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Load `path` if given, else `streamfox.toml` when present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(Some(p)),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(Some(default))
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports STREAMFOX_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Logging settings
        if let Ok(level) = std::env::var("STREAMFOX_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("STREAMFOX_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        // Quality settings
        if let Ok(interval) = std::env::var("STREAMFOX_CHECK_INTERVAL") {
            if let Ok(v) = interval.parse() {
                self.quality.quality_check_interval_seconds = v;
            }
        }
        if let Ok(size) = std::env::var("STREAMFOX_MIN_POOL_SIZE") {
            if let Ok(v) = size.parse() {
                self.quality.min_pool_size = v;
            }
        }
        if let Ok(threshold) = std::env::var("STREAMFOX_SWITCH_THRESHOLD") {
            if let Ok(v) = threshold.parse() {
                self.quality.switch_threshold_score = v;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quality.validate()?;
        self.scoring.validate()?;
        self.pool.validate(self.quality.min_pool_size)?;
        self.logging.validate()?;

        for (i, url) in self.streams.iter().enumerate() {
            validate_url(&format!("streams[{}]", i), url)?;
        }
        for (i, url) in self.seeds.iter().enumerate() {
            validate_url(&format!("seeds[{}]", i), url)?;
        }

        if !(self.probe.timeout_factor > 0.0 && self.probe.timeout_factor.is_finite()) {
            return Err(ConfigError::Validation {
                field: "probe.timeout_factor".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.probe.sample_window_ms == 0 {
            return Err(ConfigError::Validation {
                field: "probe.sample_window_ms".to_string(),
                message: "sampling window must be non-zero".to_string(),
            });
        }
        if self.probe.capture_width == 0 || self.probe.capture_height == 0 {
            return Err(ConfigError::Validation {
                field: "probe.capture_width".to_string(),
                message: "capture raster must be at least 1x1".to_string(),
            });
        }

        if self.player.players.is_empty() {
            return Err(ConfigError::Validation {
                field: "player.players".to_string(),
                message: "at least one player must be listed".to_string(),
            });
        }

        if self.crawler.max_pages == 0 {
            return Err(ConfigError::Validation {
                field: "crawler.max_pages".to_string(),
                message: "must be non-zero".to_string(),
            });
        }

        if self.metrics.enabled && self.metrics.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation {
                field: "metrics.listen_addr".to_string(),
                message: format!("'{}' is not a socket address", self.metrics.listen_addr),
            });
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: field.to_string(),
            message: "URL cannot be empty".to_string(),
        });
    }
    match url::Url::parse(value.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(parsed) => Err(ConfigError::Validation {
            field: field.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        }),
        Err(e) => Err(ConfigError::Validation {
            field: field.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolError;
    use crate::quality::ThresholdError;
    use std::path::Path;

    #[test]
    fn test_streamfox_config_defaults() {
        let config = StreamfoxConfig::default();
        assert!(config.streams.is_empty());
        assert!(config.seeds.is_empty());
        assert_eq!(config.quality.max_latency_ms, 3000.0);
        assert_eq!(config.quality.switch_threshold_score, 0.3);
        assert_eq!(config.pool.max_consecutive_failures, 5);
        assert!(!config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [quality]
        min_fps = 10.0
        "#;

        let config: StreamfoxConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.quality.min_fps, 10.0);
        assert_eq!(config.quality.min_pool_size, 3); // Default
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../streamfox.example.toml");
        let config: StreamfoxConfig = toml::from_str(toml).unwrap();
        assert!(!config.streams.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_sources_and_sections() {
        let toml = r#"
        streams = ["https://a.example.com/live.m3u8", "https://b.example.com/live.mpd"]
        seeds = ["https://example.com/watch"]

        [scoring]
        fps_excellent = 30.0

        [scoring.weights]
        latency = 0.25
        fps = 0.25
        activity = 0.25
        errors = 0.25

        [player]
        players = ["ffplay"]

        [crawler]
        max_depth = 1
        "#;

        let config: StreamfoxConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.streams.len(), 2);
        assert_eq!(config.seeds, vec!["https://example.com/watch"]);
        assert_eq!(config.scoring.fps_excellent, 30.0);
        assert_eq!(config.scoring.fps_poor, 5.0);
        assert_eq!(config.player.players, vec!["ffplay"]);
        assert_eq!(config.crawler.max_depth, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[pool]\nmax_pool_size = 20").unwrap();

        let config = StreamfoxConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.pool.max_pool_size, 20);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = StreamfoxConfig::load(Some(Path::new("/nonexistent/streamfox.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_malformed_file_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[quality\nmin_fps = ").unwrap();

        let result = StreamfoxConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = StreamfoxConfig::load(None).unwrap();
        assert_eq!(config.quality.min_pool_size, 3);
    }

    #[test]
    fn test_config_env_override_log_level() {
        std::env::set_var("STREAMFOX_LOG_LEVEL", "debug");
        let config = StreamfoxConfig::default().with_env_overrides();
        std::env::remove_var("STREAMFOX_LOG_LEVEL");

        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_env_override_log_format() {
        std::env::set_var("STREAMFOX_LOG_FORMAT", "json");
        let config = StreamfoxConfig::default().with_env_overrides();
        assert_eq!(config.logging.format, LogFormat::Json);

        // Invalid format keeps default
        std::env::set_var("STREAMFOX_LOG_FORMAT", "xml");
        let config = StreamfoxConfig::default().with_env_overrides();
        std::env::remove_var("STREAMFOX_LOG_FORMAT");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_env_override_check_interval() {
        std::env::set_var("STREAMFOX_CHECK_INTERVAL", "2.5");
        let config = StreamfoxConfig::default().with_env_overrides();
        std::env::remove_var("STREAMFOX_CHECK_INTERVAL");

        assert_eq!(config.quality.quality_check_interval_seconds, 2.5);
    }

    #[test]
    fn test_config_env_override_min_pool_size() {
        std::env::set_var("STREAMFOX_MIN_POOL_SIZE", "5");
        let config = StreamfoxConfig::default().with_env_overrides();
        assert_eq!(config.quality.min_pool_size, 5);

        std::env::set_var("STREAMFOX_MIN_POOL_SIZE", "many");
        let config = StreamfoxConfig::default().with_env_overrides();
        std::env::remove_var("STREAMFOX_MIN_POOL_SIZE");
        assert_eq!(config.quality.min_pool_size, 3);
    }

    #[test]
    fn test_config_env_override_switch_threshold() {
        std::env::set_var("STREAMFOX_SWITCH_THRESHOLD", "0.15");
        let config = StreamfoxConfig::default().with_env_overrides();
        std::env::remove_var("STREAMFOX_SWITCH_THRESHOLD");

        assert_eq!(config.quality.switch_threshold_score, 0.15);
    }

    #[test]
    fn test_config_validation_threshold() {
        let mut config = StreamfoxConfig::default();
        config.quality.switch_threshold_score = 1.5;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Threshold(ThresholdError::SwitchThresholdOutOfRange(_)))
        ));
    }

    #[test]
    fn test_config_validation_weights() {
        let mut config = StreamfoxConfig::default();
        config.scoring.weights.latency = 0.9;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Threshold(ThresholdError::WeightsSum(_)))
        ));
    }

    #[test]
    fn test_config_validation_pool_capacity() {
        let mut config = StreamfoxConfig::default();
        config.pool.max_pool_size = 2;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Pool(PoolError::CapacityBelowTarget { max: 2, min: 3 }))
        ));
    }

    #[test]
    fn test_config_validation_empty_stream_url() {
        let mut config = StreamfoxConfig::default();
        config.streams.push("https://cdn.example.com/live.m3u8".to_string());
        config.streams.push("  ".to_string());

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "streams[1]"
        ));
    }

    #[test]
    fn test_config_validation_seed_scheme() {
        let mut config = StreamfoxConfig::default();
        config.seeds.push("ftp://example.com/".to_string());

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "seeds[0]"
        ));
    }

    #[test]
    fn test_config_validation_metrics_addr() {
        let mut config = StreamfoxConfig::default();
        config.metrics.listen_addr = "not an address".to_string();
        // Only checked when the exporter is enabled
        assert!(config.validate().is_ok());

        config.metrics.enabled = true;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "metrics.listen_addr"
        ));
    }

    #[test]
    fn test_config_validation_check_interval_ceiling() {
        let mut config = StreamfoxConfig::default();
        config.quality.quality_check_interval_seconds = 1e20;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Threshold(ThresholdError::TooLarge {
                field: "quality_check_interval_seconds",
                ..
            }))
        ));
    }

    #[test]
    fn test_config_validation_log_component() {
        let mut config = StreamfoxConfig::default();
        config.logging.component_levels =
            Some([("decoder".to_string(), "debug".to_string())].into_iter().collect());

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. })
                if field == "logging.component_levels.decoder"
        ));
    }
}
