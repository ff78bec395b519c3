//! Error types for pcm-sink
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use crate::format::FormatTag;
use thiserror::Error;

/// Main error type for pcm-sink
#[derive(Error, Debug)]
pub enum Error {
    /// Input format tag not in the resolver table
    #[error("Unsupported sample format: {0:?}")]
    UnsupportedFormat(FormatTag),

    /// Hardware declined the derived stream format
    #[error("Format rejected by output device: {0}")]
    DeviceFormatRejected(String),

    /// Audio backend device or stream errors
    #[error("Audio backend error: {0}")]
    Backend(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience Result type using pcm-sink Error
pub type Result<T> = std::result::Result<T, Error>;
