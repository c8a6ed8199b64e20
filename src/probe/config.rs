//! Configuration for stream probing.

use serde::{Deserialize, Serialize};

/// Probe timing and frame-sampling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Request timeout as a multiple of `max_latency_ms`
    pub timeout_factor: f64,
    /// Length of the frame sampling window
    pub sample_window_ms: u64,
    /// Spacing of the frame pair compared for motion
    pub frame_gap_ms: u64,
    /// Capture raster width in pixels
    pub capture_width: u32,
    /// Capture raster height in pixels
    pub capture_height: u32,
    /// Mean pixel difference at or below which two frames are identical
    pub buffering_epsilon: f64,
    /// Mean pixel difference above which content counts as moving
    pub motion_floor: f64,
    /// Decoder binary (defaults to `FFMPEG_PATH` or `ffmpeg`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_factor: 2.0,
            sample_window_ms: 1000,
            frame_gap_ms: 200,
            capture_width: 64,
            capture_height: 36,
            buffering_epsilon: 0.5,
            motion_floor: 2.0,
            ffmpeg_path: None,
        }
    }
}
