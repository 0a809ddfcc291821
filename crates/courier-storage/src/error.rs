//! Storage error types.

use thiserror::Error;

/// Failures the named-data store can report.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing blob bytes failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The name index failed.
    #[error("index error: {0}")]
    Index(#[from] rusqlite::Error),

    /// No entry is indexed under the requested name.
    #[error("not found: {0}")]
    NotFound(String),
}

/// A specialized Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
