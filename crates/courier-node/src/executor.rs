//! The executor role.
//!
//! Executors announce their role and register with a broker. Whether a
//! job fits is the capability model's business, and running payloads
//! is outside this crate; until placement bundles exist, everything
//! beyond discovery is dropped.

use crate::{Context, Result, Role};
use async_trait::async_trait;
use courier_proto::BundleData;
use courier_types::NodeType;

/// A worker that registers with a broker and awaits placements.
#[derive(Debug, Default, Clone, Copy)]
pub struct Executor;

#[async_trait]
impl Role for Executor {
    fn node_type(&self) -> NodeType {
        NodeType::Executor
    }

    async fn handle_bundle(&self, ctx: &Context, bundle: BundleData) -> Result<Vec<BundleData>> {
        if bundle.kind().is_discovery() {
            return ctx.handle_discovery(&bundle).await;
        }
        tracing::warn!(kind = ?bundle.kind(), "executor won't handle this bundle type");
        Ok(Vec::new())
    }
}
