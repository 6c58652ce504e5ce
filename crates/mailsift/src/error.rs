//! Error types for message selection.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for mailsift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while normalizing dates or matching messages.
#[derive(Debug, Error)]
pub enum Error {
    /// Date text does not match the expected pattern, or its components do
    /// not form a valid calendar date/time.
    #[error("Invalid date format: {0}")]
    InvalidFormat(String),

    /// A time bound was given as a value that is neither text nor a timestamp.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A path could not be resolved against any known location.
    #[error("The file {} doesn't exist", .0.display())]
    FileNotFound(PathBuf),

    /// Malformed filter file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading a resolved file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
