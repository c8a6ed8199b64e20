//! Player executor contract.

use super::PlayerError;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Opaque reference to one started player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlayerHandle {
    id: Uuid,
    url: String,
    pid: Option<u32>,
}

impl PlayerHandle {
    pub fn new(url: impl Into<String>, pid: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            pid,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

/// Starts and stops the external player. Decode and render technology is
/// the executor's business; the controller needs only start, stop and
/// liveness.
#[async_trait]
pub trait PlayerExecutor: Send + Sync + 'static {
    /// Start playing `url`. `Ok` is the confirmation that playback started.
    /// Safe to call again for a URL after its player was stopped.
    async fn start(&self, url: &str) -> Result<PlayerHandle, PlayerError>;

    /// Stop a started player. Stopping an already exited player succeeds.
    async fn stop(&self, handle: &PlayerHandle) -> Result<(), PlayerError>;

    /// Whether the player behind `handle` is still running.
    async fn is_running(&self, _handle: &PlayerHandle) -> bool {
        true
    }
}
