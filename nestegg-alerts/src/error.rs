//! Error types for nestegg-alerts
//!
//! None of these escape the session controller; they are logged and folded
//! into its error flag.

use nestegg_common::GroupId;
use thiserror::Error;

/// Main error type for nestegg-alerts
#[derive(Error, Debug)]
pub enum Error {
    /// Finance record query failed
    #[error("Finance query error: {0}")]
    Finance(#[from] nestegg_common::Error),

    /// Snapshot database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Snapshot file I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored snapshot could not be decoded
    #[error("Corrupt alert snapshot for group {group}: {source}")]
    CorruptSnapshot {
        group: GroupId,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot could not be encoded
    #[error("Failed to encode alert snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    /// Storage backend refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Convenience Result type using nestegg-alerts Error
pub type Result<T> = std::result::Result<T, Error>;
