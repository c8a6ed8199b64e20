//! Prometheus exporter configuration

use serde::{Deserialize, Serialize};

/// Metrics exporter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `/metrics` while running
    pub enabled: bool,
    /// Address of the exporter's HTTP listener
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1:9464".to_string(),
        }
    }
}
