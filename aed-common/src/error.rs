//! Common error types for AED

use thiserror::Error;

/// Common result type for AED operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the AED crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wire record could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
}
