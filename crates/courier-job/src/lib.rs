//! # Courier Job
//!
//! The job description and capability-matching model.
//!
//! A [`JobInfo`] describes what a job needs before it can run: the
//! executable blob, input data, and a [`Capabilities`] vector a worker
//! must satisfy to admit it. Everything here is pure decision support;
//! nothing in this crate executes anything.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capabilities;
mod error;
mod job;

pub use capabilities::Capabilities;
pub use error::{JobError, Result};
pub use job::{Job, JobInfo};
