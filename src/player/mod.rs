//! External player subprocess executor.
//!
//! [`ProcessPlayer`] runs `player [extra args] url` as a child process. A
//! start is confirmed once the child survives the startup grace period;
//! stopping kills the child.

mod config;
mod program;


pub use config::PlayerConfig;
pub use program::PlayerProgram;

use crate::failover::{PlayerError, PlayerExecutor, PlayerHandle};
use async_trait::async_trait;
use dashmap::DashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use uuid::Uuid;

/// Player executor backed by a local player binary.
pub struct ProcessPlayer {
    program: PlayerProgram,
    extra_args: Vec<String>,
    startup_grace: Duration,
    children: DashMap<Uuid, Child>,
}

impl ProcessPlayer {
    pub fn new(program: PlayerProgram, config: &PlayerConfig) -> Self {
        Self {
            program,
            extra_args: config.extra_args.clone(),
            startup_grace: config.startup_grace(),
            children: DashMap::new(),
        }
    }

    /// Use the first configured player found on this host.
    pub fn detect(config: &PlayerConfig) -> Result<Self, PlayerError> {
        let program = PlayerProgram::detect(&config.players)?;
        Ok(Self::new(program, config))
    }

    pub fn program(&self) -> &PlayerProgram {
        &self.program
    }

    /// Number of players started and not yet stopped.
    pub fn running(&self) -> usize {
        self.children.len()
    }

    fn spawn(&self, url: &str) -> Result<Child, PlayerError> {
        Command::new(self.program.path())
            .args(self.program.args(&self.extra_args, url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlayerError::Spawn {
                program: self.program.name().to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl PlayerExecutor for ProcessPlayer {
    async fn start(&self, url: &str) -> Result<PlayerHandle, PlayerError> {
        let mut child = self.spawn(url)?;
        tracing::debug!(player = %self.program.name(), url, pid = ?child.id(), "Player spawned");

        tokio::time::sleep(self.startup_grace).await;
        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                return Err(PlayerError::ExitedDuringStartup {
                    url: url.to_string(),
                    code: status.code(),
                });
            }
            Err(e) => {
                return Err(PlayerError::Spawn {
                    program: self.program.name().to_string(),
                    reason: e.to_string(),
                });
            }
        }

        let handle = PlayerHandle::new(url, child.id());
        tracing::info!(player = %self.program.name(), url, pid = ?handle.pid(), "Player started");
        self.children.insert(handle.id(), child);
        Ok(handle)
    }

    async fn stop(&self, handle: &PlayerHandle) -> Result<(), PlayerError> {
        let Some((_, mut child)) = self.children.remove(&handle.id()) else {
            return Ok(());
        };
        if let Ok(Some(_)) = child.try_wait() {
            return Ok(());
        }
        child
            .kill()
            .await
            .map_err(|e| PlayerError::Stop(e.to_string()))?;
        tracing::debug!(url = %handle.url(), "Player stopped");
        Ok(())
    }

    async fn is_running(&self, handle: &PlayerHandle) -> bool {
        let Some(mut child) = self.children.get_mut(&handle.id()) else {
            return false;
        };
        matches!(child.try_wait(), Ok(None))
    }
}
