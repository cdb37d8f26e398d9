//! Common error types for Nestegg

use thiserror::Error;

/// Common result type for Nestegg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by configuration loading and finance record access
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record rejected before it was written
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored row that does not map onto a finance model
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
