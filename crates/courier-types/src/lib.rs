//! Common types used throughout `courier`.
//!
//! This crate provides the shared vocabulary for the Courier
//! delay-tolerant job and data network: endpoint identifiers and
//! node roles.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod eid;
mod node_type;

pub use eid::Eid;
pub use node_type::NodeType;

use thiserror::Error;

/// Errors from parsing the shared vocabulary.
#[derive(Debug, Error)]
pub enum TypeError {
    /// A role/service name no node role answers to.
    #[error("unknown service: {0}")]
    UnknownService(String),
}
