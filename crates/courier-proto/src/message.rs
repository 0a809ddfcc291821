//! Local-agent messages: the envelope exchanged with the bundle daemon.

use crate::{wire, BundleData, ProtoError, Result};
use courier_types::{Eid, NodeType};
use rmpv::Value;

/// Message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Outcome of a previously submitted operation.
    Reply = 1,
    /// Register an endpoint with the daemon.
    Register = 2,
    /// Fetch newly arrived bundles for an endpoint.
    Fetch = 3,
    /// Outcome of a fetch, carrying the new bundles.
    FetchReply = 4,
    /// Submit a newly created bundle for transport.
    Create = 5,
}

impl MessageType {
    /// Parses a message type from its wire tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Reply),
            2 => Some(Self::Register),
            3 => Some(Self::Fetch),
            4 => Some(Self::FetchReply),
            5 => Some(Self::Create),
            _ => None,
        }
    }

    /// The wire tag for this message type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

fn check_outcome(success: bool, error: &str, what: &str) -> Result<()> {
    if !success && error.is_empty() {
        return Err(ProtoError::MalformedMessage(format!(
            "an unsuccessful {what} needs an error"
        )));
    }
    if success && !error.is_empty() {
        return Err(ProtoError::MalformedMessage(format!(
            "a successful {what} cannot carry an error"
        )));
    }
    Ok(())
}

fn check_endpoint(endpoint_id: &Eid, what: &str) -> Result<()> {
    if endpoint_id.is_null() {
        return Err(ProtoError::MalformedMessage(format!(
            "{what} needs an endpoint, not dtn:none"
        )));
    }
    Ok(())
}

/// Outcome of a previously submitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    success: bool,
    error: String,
}

impl Reply {
    /// Creates a reply; success and error text are mutually exclusive.
    pub fn new(success: bool, error: impl Into<String>) -> Result<Self> {
        let error = error.into();
        check_outcome(success, &error, "reply")?;
        Ok(Self { success, error })
    }

    /// Whether the operation succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// The error text; non-empty exactly on failure.
    pub fn error(&self) -> &str {
        &self.error
    }

    fn to_value(&self) -> Value {
        Value::Map(vec![
            ("type".into(), u64::from(MessageType::Reply.as_u8()).into()),
            ("success".into(), self.success.into()),
            ("error".into(), self.error.as_str().into()),
        ])
    }

    fn from_map(map: &[(Value, Value)]) -> Result<Self> {
        let success = wire::get_bool(map, "success")
            .ok_or_else(|| ProtoError::MalformedMessage("reply success missing".to_string()))?;
        let error = wire::get_str(map, "error")
            .ok_or_else(|| ProtoError::MalformedMessage("reply error missing".to_string()))?;
        Self::new(success, error)
    }
}

/// Registration of an endpoint with the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    endpoint_id: Eid,
}

impl Register {
    /// Creates a registration for a non-null endpoint.
    pub fn new(endpoint_id: Eid) -> Result<Self> {
        check_endpoint(&endpoint_id, "registration")?;
        Ok(Self { endpoint_id })
    }

    /// The endpoint being registered.
    pub fn endpoint_id(&self) -> &Eid {
        &self.endpoint_id
    }

    fn to_value(&self) -> Value {
        Value::Map(vec![
            ("type".into(), u64::from(MessageType::Register.as_u8()).into()),
            ("endpoint_id".into(), self.endpoint_id.as_str().into()),
        ])
    }

    fn from_map(map: &[(Value, Value)]) -> Result<Self> {
        let endpoint_id = wire::get_str(map, "endpoint_id")
            .map(Eid::new)
            .ok_or_else(|| ProtoError::MalformedMessage("register endpoint missing".to_string()))?;
        Self::new(endpoint_id)
    }
}

/// Request for the bundles newly arrived at an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetch {
    endpoint_id: Eid,
    node_type: NodeType,
}

impl Fetch {
    /// Creates a fetch for a non-null endpoint.
    pub fn new(endpoint_id: Eid, node_type: NodeType) -> Result<Self> {
        check_endpoint(&endpoint_id, "fetch")?;
        Ok(Self {
            endpoint_id,
            node_type,
        })
    }

    /// The endpoint being drained.
    pub fn endpoint_id(&self) -> &Eid {
        &self.endpoint_id
    }

    /// The fetching node's role.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    fn to_value(&self) -> Value {
        Value::Map(vec![
            ("type".into(), u64::from(MessageType::Fetch.as_u8()).into()),
            ("endpoint_id".into(), self.endpoint_id.as_str().into()),
            ("node_type".into(), u64::from(self.node_type.as_u8()).into()),
        ])
    }

    fn from_map(map: &[(Value, Value)]) -> Result<Self> {
        let endpoint_id = wire::get_str(map, "endpoint_id")
            .map(Eid::new)
            .ok_or_else(|| ProtoError::MalformedMessage("fetch endpoint missing".to_string()))?;
        let tag = wire::get_u64(map, "node_type")
            .ok_or_else(|| ProtoError::MalformedMessage("fetch node type missing".to_string()))?;
        let node_type = u8::try_from(tag)
            .ok()
            .and_then(NodeType::from_u8)
            .ok_or_else(|| ProtoError::MalformedMessage(format!("invalid node type: {tag}")))?;
        Self::new(endpoint_id, node_type)
    }
}

/// Outcome of a fetch, carrying the newly arrived bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReply {
    success: bool,
    error: String,
    bundles: Vec<BundleData>,
}

impl FetchReply {
    /// Creates a fetch reply; success and error text are mutually
    /// exclusive, and every nested bundle is already validated by
    /// construction.
    pub fn new(success: bool, error: impl Into<String>, bundles: Vec<BundleData>) -> Result<Self> {
        let error = error.into();
        check_outcome(success, &error, "fetch reply")?;
        Ok(Self {
            success,
            error,
            bundles,
        })
    }

    /// Whether the fetch succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// The error text; non-empty exactly on failure.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// The fetched bundles, in arrival order.
    pub fn bundles(&self) -> &[BundleData] {
        &self.bundles
    }

    /// Consumes the reply, yielding the fetched bundles.
    pub fn into_bundles(self) -> Vec<BundleData> {
        self.bundles
    }

    fn to_value(&self) -> Value {
        Value::Map(vec![
            ("type".into(), u64::from(MessageType::FetchReply.as_u8()).into()),
            ("success".into(), self.success.into()),
            ("error".into(), self.error.as_str().into()),
            (
                "bundles".into(),
                Value::Array(self.bundles.iter().map(BundleData::to_value).collect()),
            ),
        ])
    }

    fn from_map(map: &[(Value, Value)]) -> Result<Self> {
        let success = wire::get_bool(map, "success").ok_or_else(|| {
            ProtoError::MalformedMessage("fetch reply success missing".to_string())
        })?;
        let error = wire::get_str(map, "error")
            .ok_or_else(|| ProtoError::MalformedMessage("fetch reply error missing".to_string()))?;
        let bundles = wire::get(map, "bundles")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ProtoError::MalformedMessage("fetch reply bundles missing".to_string())
            })?
            .iter()
            .map(BundleData::from_value)
            .collect::<Result<Vec<_>>>()?;
        Self::new(success, error, bundles)
    }
}

/// Submission of a newly created bundle for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleCreate {
    bundle: BundleData,
}

impl BundleCreate {
    /// Wraps an (already validated) bundle for submission.
    pub fn new(bundle: BundleData) -> Self {
        Self { bundle }
    }

    /// The bundle being submitted.
    pub fn bundle(&self) -> &BundleData {
        &self.bundle
    }

    fn to_value(&self) -> Value {
        Value::Map(vec![
            ("type".into(), u64::from(MessageType::Create.as_u8()).into()),
            ("bundle".into(), self.bundle.to_value()),
        ])
    }

    fn from_map(map: &[(Value, Value)]) -> Result<Self> {
        let bundle = wire::get(map, "bundle")
            .ok_or_else(|| ProtoError::MalformedMessage("create bundle missing".to_string()))?;
        Ok(Self::new(BundleData::from_value(bundle)?))
    }
}

/// Unified local-agent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Outcome of a previously submitted operation.
    Reply(Reply),
    /// Register an endpoint.
    Register(Register),
    /// Fetch newly arrived bundles.
    Fetch(Fetch),
    /// Fetch outcome with bundles.
    FetchReply(FetchReply),
    /// Submit a created bundle.
    Create(BundleCreate),
}

impl Message {
    fn to_value(&self) -> Value {
        match self {
            Message::Reply(m) => m.to_value(),
            Message::Register(m) => m.to_value(),
            Message::Fetch(m) => m.to_value(),
            Message::FetchReply(m) => m.to_value(),
            Message::Create(m) => m.to_value(),
        }
    }
}

/// Serializes a message to its wire form.
pub fn serialize(message: &Message) -> Result<Vec<u8>> {
    wire::to_bytes(&message.to_value())
}

/// Deserializes a message from its wire form.
///
/// The tag dispatch is total over [`MessageType`]; adding a variant
/// requires adding its arm here.
pub fn deserialize(bytes: &[u8]) -> Result<Message> {
    let value = wire::from_bytes(bytes)?;
    let map = value
        .as_map()
        .ok_or_else(|| ProtoError::MalformedMessage("message must be a map".to_string()))?;
    let tag = wire::get_u64(map, "type")
        .ok_or_else(|| ProtoError::MalformedMessage("message type missing".to_string()))?;
    let kind = u8::try_from(tag)
        .ok()
        .and_then(MessageType::from_u8)
        .ok_or(ProtoError::UnknownMessageType(tag))?;

    match kind {
        MessageType::Reply => Reply::from_map(map).map(Message::Reply),
        MessageType::Register => Register::from_map(map).map(Message::Register),
        MessageType::Fetch => Fetch::from_map(map).map(Message::Fetch),
        MessageType::FetchReply => FetchReply::from_map(map).map(Message::FetchReply),
        MessageType::Create => BundleCreate::from_map(map).map(Message::Create),
    }
}
