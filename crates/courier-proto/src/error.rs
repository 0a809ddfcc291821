//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while building or decoding protocol records.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A local-agent message invariant was violated.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A bundle invariant was violated.
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    /// Deserialization saw an unrecognized message-type tag.
    #[error("unknown message type: {0}")]
    UnknownMessageType(u64),
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;
