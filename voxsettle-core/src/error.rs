//! Error types for voxsettle

use thiserror::Error;

/// Main error type for voxsettle operations
///
/// Geometric operations never fail on malformed input; these variants cover
/// construction-time validation and configuration loading only.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for voxsettle operations
pub type Result<T> = std::result::Result<T, Error>;
