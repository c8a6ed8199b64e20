//! Configuration error types

use crate::pool::PoolError;
use crate::quality::ThresholdError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Invalid quality settings: {0}")]
    Threshold(#[from] ThresholdError),

    #[error("Invalid pool settings: {0}")]
    Pool(#[from] PoolError),
}
