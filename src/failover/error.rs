//! Error types for playback and failover.

use crate::pool::PoolError;
use thiserror::Error;

/// Errors reported by a player executor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    /// No supported player binary on this host
    #[error("no video player found (tried: {0})")]
    NoPlayerFound(String),

    /// Player process could not be spawned
    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// Player exited before its startup grace period elapsed
    #[error("player exited during startup for {url} (status {code:?})")]
    ExitedDuringStartup { url: String, code: Option<i32> },

    /// Player could not be stopped cleanly
    #[error("failed to stop player: {0}")]
    Stop(String),
}

/// Errors surfaced by the failover controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailoverError {
    /// Session already stopped
    #[error("playback session is stopped")]
    Stopped,

    /// No candidate to start playback with
    #[error("no playable candidate in pool")]
    NoCandidate,

    /// Every candidate tried failed to start
    #[error("all candidates failed to start: {}", .tried.join(", "))]
    Exhausted { tried: Vec<String> },

    /// Pool rejected the initial stream
    #[error(transparent)]
    Pool(#[from] PoolError),
}
