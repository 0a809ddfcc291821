//! Node error types.

use thiserror::Error;

/// Errors that can occur while running a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A protocol record was malformed.
    #[error("protocol error: {0}")]
    Proto(#[from] courier_proto::ProtoError),

    /// The named-data store failed.
    #[error("storage error: {0}")]
    Storage(#[from] courier_storage::StorageError),

    /// A job description could not be read or written.
    #[error("job error: {0}")]
    Job(#[from] courier_job::JobError),

    /// An I/O error at the transport boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bundle agent refused or broke off an operation.
    #[error("agent error: {0}")]
    Agent(String),

    /// The configuration file could not be read.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
