//! Job model error types.

use thiserror::Error;

/// Errors from reading or writing job descriptions.
#[derive(Debug, Error)]
pub enum JobError {
    /// The description text could not be parsed.
    #[error("invalid job description: {0}")]
    Parse(#[from] toml::de::Error),

    /// The value could not be rendered as a description.
    #[error("unencodable job description: {0}")]
    Format(#[from] toml::ser::Error),
}

/// A specialized Result type for job model operations.
pub type Result<T> = std::result::Result<T, JobError>;
