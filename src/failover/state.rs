//! Playback state machine and switch policy.

use serde::Serialize;

/// Playback session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    Playing { url: String },
    Switching { from: String, to: String },
    Stopped,
}

impl PlaybackState {
    /// URL currently considered active (the source while switching).
    pub fn active_url(&self) -> Option<&str> {
        match self {
            PlaybackState::Playing { url } => Some(url),
            PlaybackState::Switching { from, .. } => Some(from),
            PlaybackState::Stopped => None,
        }
    }

    pub fn is_switching(&self) -> bool {
        matches!(self, PlaybackState::Switching { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, PlaybackState::Stopped)
    }
}

/// Outcome of comparing the active stream against the pool's best.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchDecision {
    Stay,
    Switch { to: String, delta: f64 },
}

/// Decide whether to leave `active_url` for the pool's best candidate.
///
/// Switches only when the best candidate is a different URL and leads the
/// active score by at least `threshold`. Without a score for the active
/// stream, or without a live best candidate, playback stays put.
pub fn decide_switch(
    active_url: &str,
    active_score: Option<f64>,
    best: Option<(&str, f64)>,
    threshold: f64,
) -> SwitchDecision {
    let (Some(active_score), Some((best_url, best_score))) = (active_score, best) else {
        return SwitchDecision::Stay;
    };
    if best_url == active_url {
        return SwitchDecision::Stay;
    }

    let delta = best_score - active_score;
    if delta >= threshold {
        SwitchDecision::Switch {
            to: best_url.to_string(),
            delta,
        }
    } else {
        SwitchDecision::Stay
    }
}
