//! `[logging]` section: verbosity, output encoding and per-module overrides.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Crate modules that accept a `component_levels` override.
pub const LOG_COMPONENTS: &[&str] = &[
    "quality",
    "probe",
    "monitor",
    "pool",
    "discovery",
    "failover",
    "player",
    "cli",
];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// How log records are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Multi-line records for an interactive terminal
    #[default]
    Pretty,
    /// One JSON object per record, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

/// Logging settings. `STREAMFOX_LOG_LEVEL` and `STREAMFOX_LOG_FORMAT` override
/// the file, `RUST_LOG` overrides both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Per-module levels, keyed by one of [`LOG_COMPONENTS`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
        }
    }
}

impl LoggingConfig {
    /// Reject unknown levels and overrides for modules the crate does not have.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_level("logging.level", &self.level)?;

        for (component, level) in self.component_levels.iter().flatten() {
            if !LOG_COMPONENTS.contains(&component.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("logging.component_levels.{component}"),
                    message: format!("unknown component (expected one of {})", LOG_COMPONENTS.join(", ")),
                });
            }
            check_level(&format!("logging.component_levels.{component}"), level)?;
        }
        Ok(())
    }
}

fn check_level(field: &str, level: &str) -> Result<(), ConfigError> {
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            field: field.to_string(),
            message: format!("'{level}' is not a log level"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_components(pairs: &[(&str, &str)]) -> LoggingConfig {
        LoggingConfig {
            component_levels: Some(
                pairs
                    .iter()
                    .map(|(c, l)| (c.to_string(), l.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_is_info_pretty() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_format_parses_env_spelling() {
        assert_eq!(" Json ".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        let err = "logfmt".parse::<LogFormat>().unwrap_err();
        assert!(err.contains("logfmt"));
    }

    #[test]
    fn test_failover_override_from_toml() {
        let config: LoggingConfig = toml::from_str(
            r#"
            level = "warn"
            format = "json"
            [component_levels]
            failover = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.format, LogFormat::Json);
        let levels = config.component_levels.as_ref().unwrap();
        assert_eq!(levels.get("failover").map(String::as_str), Some("debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_component() {
        let config = with_components(&[("pool", "debug"), ("scheduler", "trace")]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "logging.component_levels.scheduler"
        ));
    }

    #[test]
    fn test_rejects_bad_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(with_components(&[("probe", "chatty")]).validate().is_err());
    }
}
