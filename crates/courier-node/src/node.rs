//! The node runtime: three concurrent loops around a role.

use crate::{AgentClient, Config, Context, Result, Role};
use courier_proto::{BundleData, BundleType};
use courier_types::Eid;
use tokio::time::sleep;

/// A running Courier node: shared context, a role, and the agent link.
///
/// Every node drives the same three loops for its lifetime: announce
/// presence, drain newly arrived bundles, and the role tick. A fault
/// inside one cycle is logged and the loop proceeds to its next sleep;
/// nothing short of process shutdown stops a loop.
pub struct Node<R: Role> {
    ctx: Context,
    role: R,
    agent: AgentClient,
    config: Config,
}

impl<R: Role> Node<R> {
    /// Connects to the bundle agent and prepares the node.
    pub async fn connect(node_id: Eid, role: R, config: Config) -> Result<Self> {
        let agent = AgentClient::connect(&config.socket).await?;
        let ctx = Context::new(node_id, role.node_type());
        Ok(Self {
            ctx,
            role,
            agent,
            config,
        })
    }

    /// The node's shared context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Registers with the agent, then drives the periodic loops until
    /// the process shuts down.
    pub async fn run(&self) -> Result<()> {
        self.agent.register(self.ctx.node_id()).await?;
        tracing::info!(
            node = %self.ctx.node_id(),
            role = %self.role.node_type(),
            "node running"
        );
        tokio::join!(self.announce_loop(), self.intake_loop(), self.tick_loop());
        Ok(())
    }

    async fn announce_loop(&self) {
        loop {
            sleep(self.config.announce_interval).await;
            if let Err(err) = self.announce_once().await {
                tracing::warn!(%err, "announcement failed");
            }
        }
    }

    async fn announce_once(&self) -> Result<()> {
        let announcement = BundleData::build(
            BundleType::BrokerAnnounce,
            self.ctx.node_id().clone(),
            Eid::broadcast(),
        )
        .node_type(self.role.node_type())
        .finish()?;
        self.agent.create(announcement).await
    }

    async fn intake_loop(&self) {
        loop {
            sleep(self.config.poll_interval).await;
            if let Err(err) = self.intake_cycle().await {
                tracing::warn!(%err, "bundle intake failed");
            }
        }
    }

    /// One intake cycle: fetch, handle in arrival order, submit the
    /// batched replies.
    async fn intake_cycle(&self) -> Result<()> {
        let bundles = self
            .agent
            .fetch(self.ctx.node_id(), self.role.node_type())
            .await?;
        if bundles.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = bundles.len(), "handling new bundles");
        let mut replies = Vec::new();
        for bundle in bundles {
            // One bad bundle must not block the rest of the batch.
            match self.role.handle_bundle(&self.ctx, bundle).await {
                Ok(batch) => replies.extend(batch),
                Err(err) => tracing::warn!(%err, "dropped a bundle"),
            }
        }
        self.submit(replies).await
    }

    async fn tick_loop(&self) {
        loop {
            sleep(self.config.tick_interval).await;
            match self.role.tick(&self.ctx).await {
                Ok(bundles) => {
                    if let Err(err) = self.submit(bundles).await {
                        tracing::warn!(%err, "tick submission failed");
                    }
                }
                Err(err) => tracing::warn!(%err, "tick failed"),
            }
        }
    }

    async fn submit(&self, bundles: Vec<BundleData>) -> Result<()> {
        for bundle in bundles {
            self.agent.create(bundle).await?;
        }
        Ok(())
    }
}
