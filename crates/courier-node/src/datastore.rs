//! The datastore role: named-data bundles against the blob store.

use crate::{Context, Result, Role};
use async_trait::async_trait;
use courier_proto::{BundleData, BundleType, NamedData};
use courier_storage::Storage;
use courier_types::NodeType;
use std::path::Path;

/// Holds named, content-addressed blobs and answers put, get, and
/// delete bundles.
pub struct Datastore {
    storage: Storage,
}

impl Datastore {
    /// Opens the role's store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            storage: Storage::open(root)?,
        })
    }

    fn requested_name(bundle: &BundleData) -> Option<&str> {
        bundle.named_data().and_then(NamedData::first)
    }

    fn handle_put(&self, ctx: &Context, bundle: &BundleData) -> Result<Vec<BundleData>> {
        let Some(name) = Self::requested_name(bundle) else {
            return Ok(Vec::new());
        };
        self.storage.store(name, bundle.payload())?;
        let ack = BundleData::build(
            BundleType::NdataPut,
            ctx.node_id().clone(),
            bundle.source().clone(),
        )
        .named_data(name)
        .finish()?;
        Ok(vec![ack])
    }

    /// One reply per matching entry, in insertion order; no matches
    /// means no replies, not an error bundle.
    fn handle_get(&self, ctx: &Context, bundle: &BundleData) -> Result<Vec<BundleData>> {
        let Some(name) = Self::requested_name(bundle) else {
            return Ok(Vec::new());
        };
        let entries = self.storage.load(name)?;
        tracing::debug!(name, matches = entries.len(), "answering data lookup");
        entries
            .into_iter()
            .map(|(entry_name, data)| {
                let reply = BundleData::build(
                    BundleType::NdataGet,
                    ctx.node_id().clone(),
                    bundle.source().clone(),
                )
                .named_data(entry_name)
                .payload(data)
                .finish()?;
                Ok(reply)
            })
            .collect()
    }

    fn handle_del(&self, ctx: &Context, bundle: &BundleData) -> Result<Vec<BundleData>> {
        let Some(name) = Self::requested_name(bundle) else {
            return Ok(Vec::new());
        };
        self.storage.remove(name)?;
        let ack = BundleData::build(
            BundleType::NdataDel,
            ctx.node_id().clone(),
            bundle.source().clone(),
        )
        .named_data(name)
        .finish()?;
        Ok(vec![ack])
    }
}

#[async_trait]
impl Role for Datastore {
    fn node_type(&self) -> NodeType {
        NodeType::Datastore
    }

    async fn handle_bundle(&self, ctx: &Context, bundle: BundleData) -> Result<Vec<BundleData>> {
        match bundle.kind() {
            kind if kind.is_discovery() => ctx.handle_discovery(&bundle).await,
            BundleType::NdataPut => self.handle_put(ctx, &bundle),
            BundleType::NdataGet => self.handle_get(ctx, &bundle),
            BundleType::NdataDel => self.handle_del(ctx, &bundle),
            other => {
                tracing::warn!(kind = ?other, "datastore won't handle this bundle type");
                Ok(Vec::new())
            }
        }
    }
}
