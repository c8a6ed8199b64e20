//! Configuration for the external player.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Player selection and startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Player binaries in preference order (names on `PATH` or paths)
    pub players: Vec<String>,
    /// Arguments inserted before the stream URL
    pub extra_args: Vec<String>,
    /// A player still running after this long counts as started
    pub startup_grace_ms: u64,
    /// Stop playback when the pool has no live candidate for this long
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhaustion_timeout_seconds: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            players: vec!["mpv".to_string(), "vlc".to_string(), "ffplay".to_string()],
            extra_args: Vec::new(),
            startup_grace_ms: 1500,
            exhaustion_timeout_seconds: None,
        }
    }
}

impl PlayerConfig {
    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }

    pub fn exhaustion_timeout(&self) -> Option<Duration> {
        self.exhaustion_timeout_seconds.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.players, vec!["mpv", "vlc", "ffplay"]);
        assert_eq!(config.startup_grace(), Duration::from_millis(1500));
        assert_eq!(config.exhaustion_timeout(), None);
    }

    #[test]
    fn test_partial_toml() {
        let config: PlayerConfig = toml::from_str(
            r#"
            players = ["ffplay"]
            exhaustion_timeout_seconds = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.players, vec!["ffplay"]);
        assert_eq!(config.startup_grace_ms, 1500);
        assert_eq!(config.exhaustion_timeout(), Some(Duration::from_secs(120)));
    }
}
