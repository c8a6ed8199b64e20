//! Error types for stream discovery.

use thiserror::Error;

/// Errors that can occur while crawling for stream URLs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscoveryError {
    /// Seed is not an absolute http(s) URL
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    /// Request timeout
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Seed page answered with an error status
    #[error("HTTP error {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}
