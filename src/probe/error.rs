//! Error types for stream probing.

use thiserror::Error;

/// Errors from the frame capture collaborator.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// Capture process could not be started
    #[error("failed to start capture: {0}")]
    Spawn(String),

    /// Decoder exited without producing frames
    #[error("decoder exited with status {code:?}: {stderr}")]
    Decoder { code: Option<i32>, stderr: String },

    /// Capture did not finish within its window
    #[error("capture timed out after {0}ms")]
    Timeout(u64),

    /// Pixel buffer does not match the declared raster size
    #[error("frame buffer has {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
}

/// Errors that can occur while probing a stream.
///
/// Never returned to probe callers; probes fold them into degraded metrics.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// Request timeout
    #[error("request timeout after {0}ms")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Server answered with an error status
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// Frame sampling failed
    #[error("frame capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}
