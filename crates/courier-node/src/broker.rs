//! The broker role: rendezvous point for discovery and job placement.

use crate::{Context, NoopScheduler, Result, Role, Scheduler};
use async_trait::async_trait;
use courier_job::JobInfo;
use courier_proto::{pack_job_board, BundleData, BundleType, JobBoard};
use courier_types::NodeType;

/// Mediates peer discovery, keeps the job board, and runs the
/// placement scheduler.
pub struct Broker {
    scheduler: Box<dyn Scheduler>,
}

impl Broker {
    /// Creates a broker with the shipped no-op scheduler.
    pub fn new() -> Self {
        Self::with_scheduler(Box::new(NoopScheduler))
    }

    /// Creates a broker running the given placement policy.
    pub fn with_scheduler(scheduler: Box<dyn Scheduler>) -> Self {
        Self { scheduler }
    }

    /// Broker-side discovery: record announcing brokers, ack
    /// registration requests.
    async fn handle_discovery(&self, ctx: &Context, bundle: &BundleData) -> Result<Vec<BundleData>> {
        match bundle.kind() {
            BundleType::BrokerAnnounce => {
                // Peer awareness only; brokers do not register with
                // each other.
                if bundle.source() != ctx.node_id() && bundle.node_type() == Some(NodeType::Broker)
                {
                    let mut state = ctx.state().write().await;
                    state
                        .peers
                        .entry(NodeType::Broker)
                        .or_default()
                        .insert(bundle.source().clone());
                    tracing::debug!(peer = %bundle.source(), "another broker announced itself");
                }
                Ok(Vec::new())
            }
            BundleType::BrokerRequest => {
                let Some(role) = bundle.node_type() else {
                    return Ok(Vec::new());
                };
                {
                    let mut state = ctx.state().write().await;
                    state
                        .peers
                        .entry(role)
                        .or_default()
                        .insert(bundle.source().clone());
                }
                tracing::info!(node = %bundle.source(), %role, "discovered node");
                let ack = BundleData::build(
                    BundleType::BrokerAck,
                    ctx.node_id().clone(),
                    bundle.source().clone(),
                )
                .node_type(NodeType::Broker)
                .finish()?;
                Ok(vec![ack])
            }
            other => {
                tracing::warn!(kind = ?other, "broker discovery won't handle this bundle type");
                Ok(Vec::new())
            }
        }
    }

    /// Answers a job query with the current board, read-only.
    async fn handle_job_query(&self, ctx: &Context, bundle: &BundleData) -> Result<Vec<BundleData>> {
        let Some(submitter) = bundle.submitter().cloned() else {
            return Ok(Vec::new());
        };
        let board = {
            let state = ctx.state().read().await;
            JobBoard {
                completed: state.completed_jobs.iter().cloned().collect(),
                queued: state.queued_jobs.iter().cloned().collect(),
            }
        };
        // Serialization happens outside the lock.
        let payload = pack_job_board(&board)?;
        let reply = BundleData::build(
            BundleType::JobList,
            ctx.node_id().clone(),
            bundle.source().clone(),
        )
        .submitter(submitter)
        .payload(payload)
        .finish()?;
        Ok(vec![reply])
    }

    /// Parses a submitted job description, queues it, and acks.
    async fn handle_job_submit(&self, ctx: &Context, bundle: &BundleData) -> Result<Vec<BundleData>> {
        let job = JobInfo::loads(&String::from_utf8_lossy(bundle.payload()))?;
        let job_id = job.job_id;
        {
            let mut state = ctx.state().write().await;
            state.queued_jobs.push_back(job);
        }
        tracing::info!(%job_id, submitter = %bundle.source(), "queued job");
        let ack = BundleData::build(
            BundleType::JobSubmit,
            ctx.node_id().clone(),
            bundle.source().clone(),
        )
        .payload(job_id.to_string().into_bytes())
        .finish()?;
        Ok(vec![ack])
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Role for Broker {
    fn node_type(&self) -> NodeType {
        NodeType::Broker
    }

    async fn handle_bundle(&self, ctx: &Context, bundle: BundleData) -> Result<Vec<BundleData>> {
        match bundle.kind() {
            kind if kind.is_discovery() => self.handle_discovery(ctx, &bundle).await,
            BundleType::JobQuery => self.handle_job_query(ctx, &bundle).await,
            BundleType::JobSubmit => self.handle_job_submit(ctx, &bundle).await,
            other => {
                tracing::warn!(kind = ?other, "broker won't handle this bundle type");
                Ok(Vec::new())
            }
        }
    }

    /// One scheduler pass over a snapshot of the queue and the
    /// discovered executors.
    async fn tick(&self, ctx: &Context) -> Result<Vec<BundleData>> {
        let (queued, executors) = {
            let state = ctx.state().read().await;
            (
                state.queued_jobs.iter().cloned().collect::<Vec<_>>(),
                state
                    .peers
                    .get(&NodeType::Executor)
                    .cloned()
                    .unwrap_or_default(),
            )
        };
        let assignments = self.scheduler.assign(&queued, &executors);
        if !assignments.is_empty() {
            tracing::debug!(count = assignments.len(), "scheduler proposed placements");
        }
        Ok(Vec::new())
    }
}
