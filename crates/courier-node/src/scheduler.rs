//! The job-placement seam.

use courier_job::JobInfo;
use courier_types::Eid;
use std::collections::HashSet;
use uuid::Uuid;

/// A placement decision: which executor should take a queued job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// The job being placed.
    pub job_id: Uuid,
    /// The executor chosen for it.
    pub executor: Eid,
}

/// Decides placements for queued jobs.
///
/// The broker's periodic tick snapshots the queue and the discovered
/// executors and hands both here. Implementations are pure decision
/// logic; acting on the decisions is the caller's business.
pub trait Scheduler: Send + Sync {
    /// Proposes assignments for the given queue and executor set.
    fn assign(&self, queued: &[JobInfo], executors: &HashSet<Eid>) -> Vec<Assignment>;
}

/// The shipped placement policy: decides nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl Scheduler for NoopScheduler {
    fn assign(&self, _queued: &[JobInfo], _executors: &HashSet<Eid>) -> Vec<Assignment> {
        Vec::new()
    }
}
