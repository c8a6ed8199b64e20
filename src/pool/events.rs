//! Pool notifications.

use serde::Serialize;

/// Why a candidate left the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EvictionReason {
    /// Consecutive probe failures reached the ceiling; never retried
    Exhausted { failures: u32 },
    /// Made room for a better URL at capacity
    Displaced { by: String },
}

/// Events published on the pool's broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A candidate entered the pool
    Added { url: String },
    /// A candidate was removed by the pool
    Evicted { url: String, reason: EvictionReason },
    /// Live candidates fell below the target; the owner should supply more.
    /// Fires at most once per tick.
    NeedsCandidates { live: usize, target: usize },
    /// A monitor tick was applied and the ranking refreshed
    Updated {
        tick: u64,
        live: usize,
        best: Option<(String, f64)>,
    },
}
