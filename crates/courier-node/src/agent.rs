//! Client for the local bundle-transport daemon.

use crate::{NodeError, Result};
use bytes::Bytes;
use courier_proto::{deserialize, serialize, BundleCreate, BundleData, Fetch, Message, Register};
use courier_types::{Eid, NodeType};
use futures::{SinkExt, StreamExt};
use std::path::Path;
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Connection to the bundle agent over its local socket.
///
/// Every exchange is one length-delimited frame out and one frame
/// back, each carrying a serialized [`Message`]. A mutex serializes
/// exchanges so replies pair up with their requests.
pub struct AgentClient {
    channel: Mutex<Framed<UnixStream, LengthDelimitedCodec>>,
}

impl AgentClient {
    /// Connects to the agent listening on `socket`.
    pub async fn connect(socket: impl AsRef<Path>) -> Result<Self> {
        let socket = socket.as_ref();
        let stream = UnixStream::connect(socket).await?;
        tracing::info!(socket = %socket.display(), "connected to bundle agent");
        Ok(Self {
            channel: Mutex::new(Framed::new(stream, LengthDelimitedCodec::new())),
        })
    }

    /// Registers `endpoint_id` so the agent starts holding its bundles.
    pub async fn register(&self, endpoint_id: &Eid) -> Result<()> {
        let message = Message::Register(Register::new(endpoint_id.clone())?);
        match self.exchange(&message).await? {
            Message::Reply(reply) if reply.success() => Ok(()),
            Message::Reply(reply) => Err(NodeError::Agent(reply.error().to_string())),
            other => Err(unexpected(&other)),
        }
    }

    /// Drains the bundles newly arrived for `endpoint_id`, in arrival
    /// order.
    pub async fn fetch(&self, endpoint_id: &Eid, node_type: NodeType) -> Result<Vec<BundleData>> {
        let message = Message::Fetch(Fetch::new(endpoint_id.clone(), node_type)?);
        match self.exchange(&message).await? {
            Message::FetchReply(reply) if reply.success() => Ok(reply.into_bundles()),
            Message::FetchReply(reply) => Err(NodeError::Agent(reply.error().to_string())),
            other => Err(unexpected(&other)),
        }
    }

    /// Submits a newly created bundle for transport.
    pub async fn create(&self, bundle: BundleData) -> Result<()> {
        let message = Message::Create(BundleCreate::new(bundle));
        match self.exchange(&message).await? {
            Message::Reply(reply) if reply.success() => Ok(()),
            Message::Reply(reply) => Err(NodeError::Agent(reply.error().to_string())),
            other => Err(unexpected(&other)),
        }
    }

    async fn exchange(&self, message: &Message) -> Result<Message> {
        let frame = Bytes::from(serialize(message)?);
        let mut channel = self.channel.lock().await;
        channel.send(frame).await?;
        let reply = channel
            .next()
            .await
            .ok_or_else(|| NodeError::Agent("agent closed the connection".to_string()))??;
        Ok(deserialize(&reply)?)
    }
}

fn unexpected(message: &Message) -> NodeError {
    NodeError::Agent(format!("unexpected agent response: {message:?}"))
}
