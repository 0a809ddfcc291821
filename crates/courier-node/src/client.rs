//! The client role: asks the discovered broker for its job board.

use crate::{Context, DiscoveryState, Result, Role};
use async_trait::async_trait;
use courier_proto::{unpack_job_board, BundleData, BundleType};
use courier_types::{Eid, NodeType};
use std::sync::atomic::{AtomicBool, Ordering};

/// A peer that queries the job board on behalf of a submitter.
pub struct Client {
    submitter: Eid,
    queried: AtomicBool,
}

impl Client {
    /// Creates a client querying on behalf of `submitter`.
    pub fn new(submitter: Eid) -> Self {
        Self {
            submitter,
            queried: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Role for Client {
    fn node_type(&self) -> NodeType {
        NodeType::Client
    }

    async fn handle_bundle(&self, ctx: &Context, bundle: BundleData) -> Result<Vec<BundleData>> {
        match bundle.kind() {
            kind if kind.is_discovery() => ctx.handle_discovery(&bundle).await,
            BundleType::JobList => {
                let board = unpack_job_board(bundle.payload())?;
                tracing::info!(
                    broker = %bundle.source(),
                    completed = board.completed.len(),
                    queued = board.queued.len(),
                    "job board received"
                );
                Ok(Vec::new())
            }
            other => {
                tracing::warn!(kind = ?other, "client won't handle this bundle type");
                Ok(Vec::new())
            }
        }
    }

    /// Emits one job query once the handshake has completed.
    async fn tick(&self, ctx: &Context) -> Result<Vec<BundleData>> {
        let broker = {
            let state = ctx.state().read().await;
            match (state.discovery, &state.broker) {
                (DiscoveryState::Registered, Some(broker)) => broker.clone(),
                _ => return Ok(Vec::new()),
            }
        };
        if self.queried.swap(true, Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        let query = BundleData::build(BundleType::JobQuery, ctx.node_id().clone(), broker)
            .submitter(self.submitter.clone())
            .finish()?;
        Ok(vec![query])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_proto::{pack_job_board, JobBoard};

    fn client_id() -> Eid {
        Eid::dtn("client", "")
    }

    fn broker_id() -> Eid {
        Eid::dtn("relay", "")
    }

    async fn registered_ctx() -> Context {
        let ctx = Context::new(client_id(), NodeType::Client);
        let mut state = ctx.state().write().await;
        state.discovery = DiscoveryState::Registered;
        state.broker = Some(broker_id());
        drop(state);
        ctx
    }

    #[tokio::test]
    async fn no_query_before_registration() {
        let client = Client::new(client_id());
        let ctx = Context::new(client_id(), NodeType::Client);
        assert!(client.tick(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn queries_the_broker_exactly_once() {
        let client = Client::new(client_id());
        let ctx = registered_ctx().await;

        let bundles = client.tick(&ctx).await.unwrap();
        assert_eq!(bundles.len(), 1);
        let query = &bundles[0];
        assert_eq!(query.kind(), BundleType::JobQuery);
        assert_eq!(query.source(), &client_id());
        assert_eq!(query.destination(), &broker_id());
        assert_eq!(query.submitter(), Some(&client_id()));

        assert!(client.tick(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn job_list_is_consumed_without_a_reply() {
        let client = Client::new(client_id());
        let ctx = registered_ctx().await;
        let payload = pack_job_board(&JobBoard::default()).unwrap();
        let list = BundleData::build(BundleType::JobList, broker_id(), client_id())
            .submitter(client_id())
            .payload(payload)
            .finish()
            .unwrap();

        let replies = client.handle_bundle(&ctx, list).await.unwrap();
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn garbage_job_list_is_an_error() {
        let client = Client::new(client_id());
        let ctx = registered_ctx().await;
        let list = BundleData::build(BundleType::JobList, broker_id(), client_id())
            .submitter(client_id())
            .payload(b"not msgpack".as_slice())
            .finish()
            .unwrap();

        assert!(client.handle_bundle(&ctx, list).await.is_err());
    }
}
