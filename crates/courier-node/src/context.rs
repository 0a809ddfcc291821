//! Per-node shared state and the base discovery state machine.

use crate::Result;
use courier_job::JobInfo;
use courier_proto::{BundleData, BundleType};
use courier_types::{Eid, NodeType};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;

/// Where a node stands in the broker handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    /// No broker known yet.
    Unregistered,
    /// A registration request is out, no ack yet.
    AwaitingAck,
    /// A broker acknowledged this node.
    Registered,
}

/// The mutable state shared by a node's concurrent loops.
///
/// Guarded by the context's reader/writer lock; the job fields are
/// only used by brokers.
#[derive(Debug)]
pub struct NodeState {
    /// Progress of the broker handshake.
    pub discovery: DiscoveryState,
    /// The broker this node is registered with, once known.
    pub broker: Option<Eid>,
    /// Discovered peers, by role.
    pub peers: HashMap<NodeType, HashSet<Eid>>,
    /// Jobs waiting for placement, in arrival order.
    pub queued_jobs: VecDeque<JobInfo>,
    /// Jobs that have finished.
    pub completed_jobs: HashSet<JobInfo>,
}

/// A node's identity plus its lock-guarded shared state.
///
/// One context is created at node start, shared by the announce,
/// intake, and tick loops, and torn down with the node. The lock is
/// scoped to in-memory updates only and is never held across an
/// exchange with the bundle agent.
#[derive(Debug)]
pub struct Context {
    node_id: Eid,
    node_type: NodeType,
    state: RwLock<NodeState>,
}

impl Context {
    /// Creates the context for a node of the given identity and role.
    ///
    /// A broker is its own rendezvous point from the start; everyone
    /// else begins unregistered.
    pub fn new(node_id: Eid, node_type: NodeType) -> Self {
        let (discovery, broker) = if node_type == NodeType::Broker {
            (DiscoveryState::Registered, Some(node_id.clone()))
        } else {
            (DiscoveryState::Unregistered, None)
        };
        Self {
            node_id,
            node_type,
            state: RwLock::new(NodeState {
                discovery,
                broker,
                peers: NodeType::all()
                    .into_iter()
                    .map(|role| (role, HashSet::new()))
                    .collect(),
                queued_jobs: VecDeque::new(),
                completed_jobs: HashSet::new(),
            }),
        }
    }

    /// This node's endpoint identifier.
    pub fn node_id(&self) -> &Eid {
        &self.node_id
    }

    /// This node's role.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// The lock guarding the shared state.
    pub fn state(&self) -> &RwLock<NodeState> {
        &self.state
    }

    /// Runs one inbound bundle through the base discovery machine.
    ///
    /// Returns the ordered replies to submit; unknown or misdirected
    /// bundles are dropped with a warning, never an error.
    pub async fn handle_discovery(&self, bundle: &BundleData) -> Result<Vec<BundleData>> {
        match bundle.kind() {
            BundleType::BrokerAnnounce => {
                if bundle.source() == &self.node_id {
                    return Ok(Vec::new());
                }
                {
                    let mut state = self.state.write().await;
                    // Repeated announces just re-send the request; a
                    // registered node keeps its broker until a new ack.
                    if state.discovery == DiscoveryState::Unregistered {
                        state.discovery = DiscoveryState::AwaitingAck;
                    }
                }
                let request = BundleData::build(
                    BundleType::BrokerRequest,
                    self.node_id.clone(),
                    bundle.source().clone(),
                )
                .node_type(self.node_type)
                .finish()?;
                tracing::debug!(broker = %bundle.source(), "requesting registration");
                Ok(vec![request])
            }
            BundleType::BrokerAck => {
                if bundle.destination() != &self.node_id {
                    tracing::warn!(
                        destination = %bundle.destination(),
                        "ignoring broker ack addressed to someone else"
                    );
                    return Ok(Vec::new());
                }
                let mut state = self.state.write().await;
                state.broker = Some(bundle.source().clone());
                state.discovery = DiscoveryState::Registered;
                tracing::info!(broker = %bundle.source(), "registered with broker");
                Ok(Vec::new())
            }
            BundleType::BrokerRequest => {
                tracing::warn!(
                    source = %bundle.source(),
                    "only brokers answer registration requests"
                );
                Ok(Vec::new())
            }
            other => {
                tracing::warn!(kind = ?other, "bundle type has no discovery handling");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_id() -> Eid {
        Eid::dtn("worker", "")
    }

    fn broker_id() -> Eid {
        Eid::dtn("relay", "")
    }

    fn announce(from: &Eid) -> BundleData {
        BundleData::build(BundleType::BrokerAnnounce, from.clone(), Eid::broadcast())
            .node_type(NodeType::Broker)
            .finish()
            .unwrap()
    }

    fn ack(from: &Eid, to: &Eid) -> BundleData {
        BundleData::build(BundleType::BrokerAck, from.clone(), to.clone())
            .node_type(NodeType::Broker)
            .finish()
            .unwrap()
    }

    #[tokio::test]
    async fn announce_triggers_exactly_one_request() {
        let ctx = Context::new(node_id(), NodeType::Executor);

        let replies = ctx.handle_discovery(&announce(&broker_id())).await.unwrap();
        assert_eq!(replies.len(), 1);
        let request = &replies[0];
        assert_eq!(request.kind(), BundleType::BrokerRequest);
        assert_eq!(request.source(), &node_id());
        assert_eq!(request.destination(), &broker_id());
        assert_eq!(request.node_type(), Some(NodeType::Executor));
        assert!(request.success());
        assert_eq!(request.error(), "");

        let state = ctx.state().read().await;
        assert_eq!(state.discovery, DiscoveryState::AwaitingAck);
        assert!(state.broker.is_none());
    }

    #[tokio::test]
    async fn ack_completes_the_handshake() {
        let ctx = Context::new(node_id(), NodeType::Datastore);
        ctx.handle_discovery(&announce(&broker_id())).await.unwrap();

        let replies = ctx
            .handle_discovery(&ack(&broker_id(), &node_id()))
            .await
            .unwrap();
        assert!(replies.is_empty());

        let state = ctx.state().read().await;
        assert_eq!(state.discovery, DiscoveryState::Registered);
        assert_eq!(state.broker, Some(broker_id()));
    }

    #[tokio::test]
    async fn repeated_announces_are_idempotent() {
        let ctx = Context::new(node_id(), NodeType::Client);
        ctx.handle_discovery(&announce(&broker_id())).await.unwrap();
        ctx.handle_discovery(&ack(&broker_id(), &node_id()))
            .await
            .unwrap();

        // Another announce re-sends the request without dropping the
        // registered broker.
        let replies = ctx.handle_discovery(&announce(&broker_id())).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].kind(), BundleType::BrokerRequest);

        let state = ctx.state().read().await;
        assert_eq!(state.discovery, DiscoveryState::Registered);
        assert_eq!(state.broker, Some(broker_id()));
    }

    #[tokio::test]
    async fn own_announce_is_ignored() {
        let ctx = Context::new(node_id(), NodeType::Executor);
        let replies = ctx.handle_discovery(&announce(&node_id())).await.unwrap();
        assert!(replies.is_empty());

        let state = ctx.state().read().await;
        assert_eq!(state.discovery, DiscoveryState::Unregistered);
    }

    #[tokio::test]
    async fn misdirected_ack_is_ignored() {
        let ctx = Context::new(node_id(), NodeType::Executor);
        let replies = ctx
            .handle_discovery(&ack(&broker_id(), &Eid::dtn("bystander", "")))
            .await
            .unwrap();
        assert!(replies.is_empty());

        let state = ctx.state().read().await;
        assert!(state.broker.is_none());
    }

    #[tokio::test]
    async fn request_at_a_non_broker_is_dropped() {
        let ctx = Context::new(node_id(), NodeType::Executor);
        let request = BundleData::build(
            BundleType::BrokerRequest,
            broker_id(),
            node_id(),
        )
        .node_type(NodeType::Datastore)
        .finish()
        .unwrap();

        let replies = ctx.handle_discovery(&request).await.unwrap();
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn stray_bundle_types_are_dropped() {
        let ctx = Context::new(node_id(), NodeType::Executor);
        let stray = BundleData::build(BundleType::JobResult, broker_id(), node_id())
            .finish()
            .unwrap();

        let replies = ctx.handle_discovery(&stray).await.unwrap();
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn a_broker_starts_registered_with_itself() {
        let ctx = Context::new(broker_id(), NodeType::Broker);
        let state = ctx.state().read().await;
        assert_eq!(state.discovery, DiscoveryState::Registered);
        assert_eq!(state.broker, Some(broker_id()));
    }
}
