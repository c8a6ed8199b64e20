//! Playback notifications.

use serde::Serialize;

/// Why a playback session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit stop
    Requested,
    /// No candidate could be started
    Exhausted,
    /// Pool stayed without a live candidate past the configured timeout
    ExhaustionTimeout,
}

/// Events published by the failover controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Started { url: String },
    SwitchStarted { from: String, to: String },
    SwitchCompleted { from: String, to: String },
    /// Target failed to start; playback restored on the previous stream
    RolledBack { from: String, failed: String },
    /// Target and rollback failed; playback continued on another candidate
    FellBack { failed: Vec<String>, to: String },
    /// The player for `url` exited on its own
    PlayerExited { url: String },
    Stopped { reason: StopReason },
}
