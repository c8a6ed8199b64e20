//! Streamfox - quality-aware live stream failover
//!
//! Keeps a pool of candidate URLs for the same live content, probes every
//! candidate on a fixed cadence, ranks them by a composite quality score and
//! switches playback when another candidate is clearly better.
//!
//! Data flows bottom-up: [`probe`] produces metric snapshots, [`quality`]
//! reduces them to a score, [`monitor`] publishes one table per tick,
//! [`pool`] keeps the ranked candidate set and asks for replenishment, and
//! [`failover`] compares the active stream against the pool's best and drives
//! the [`player`].

pub mod cli;
pub mod config;
pub mod discovery;
pub mod failover;
pub mod logging;
pub mod monitor;
pub mod player;
pub mod pool;
pub mod probe;
pub mod quality;
