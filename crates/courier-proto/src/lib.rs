//! # Courier Proto
//!
//! The wire vocabulary shared by every Courier node: bundles carried
//! over the delay-tolerant transport and the local-agent messages
//! exchanged with the bundle daemon.
//!
//! Both layers use a compact MessagePack map encoding. Construction is
//! the single validation gate: a [`BundleData`] or [`Message`] that
//! exists is structurally valid, whether it was built locally or
//! decoded off the wire.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bundle;
mod error;
mod jobs;
mod message;
mod wire;

pub use bundle::{BundleBuilder, BundleData, BundleType, NamedData};
pub use error::{ProtoError, Result};
pub use jobs::{pack_job_board, unpack_job_board, JobBoard};
pub use message::{
    deserialize, serialize, BundleCreate, Fetch, FetchReply, Message, MessageType, Register, Reply,
};
