//! The role seam: what differs between broker, datastore, executor,
//! and client.

use crate::{Context, Result};
use async_trait::async_trait;
use courier_proto::BundleData;
use courier_types::NodeType;

/// Role-specific behavior plugged into the node runtime.
///
/// The runtime owns the loops; a role decides how inbound bundles are
/// answered and what the periodic tick does. Handlers always return an
/// ordered sequence of zero-or-more reply bundles, which the runtime
/// batches and submits after the whole intake cycle.
#[async_trait]
pub trait Role: Send + Sync + 'static {
    /// The role tag announced to the network.
    fn node_type(&self) -> NodeType;

    /// Answers one inbound bundle.
    async fn handle_bundle(&self, ctx: &Context, bundle: BundleData) -> Result<Vec<BundleData>>;

    /// One pass of the role's periodic work.
    async fn tick(&self, _ctx: &Context) -> Result<Vec<BundleData>> {
        Ok(Vec::new())
    }
}
