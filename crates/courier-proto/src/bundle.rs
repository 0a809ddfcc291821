//! Bundles: the units carried over the delay-tolerant transport.

use crate::{wire, ProtoError, Result};
use bytes::Bytes;
use courier_types::{Eid, NodeType};
use rmpv::Value;

/// Bundle type discriminator, grouped into ranges per concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BundleType {
    /// A node announcing its presence to the broadcast address.
    BrokerAnnounce = 1,
    /// A node asking an announcing broker to register it.
    BrokerRequest = 2,
    /// A broker confirming a registration request.
    BrokerAck = 3,

    /// Submission of a job description.
    JobSubmit = 11,
    /// Results of a finished job.
    JobResult = 12,
    /// A submitter asking a broker for its job board.
    JobQuery = 13,
    /// A broker's job board in reply to a query.
    JobList = 14,

    /// Store a payload under a name.
    NdataPut = 21,
    /// Fetch stored entries by name or name prefix.
    NdataGet = 22,
    /// Remove stored entries by name or name prefix.
    NdataDel = 23,
}

impl BundleType {
    /// Parses a bundle type from its wire tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::BrokerAnnounce),
            2 => Some(Self::BrokerRequest),
            3 => Some(Self::BrokerAck),
            11 => Some(Self::JobSubmit),
            12 => Some(Self::JobResult),
            13 => Some(Self::JobQuery),
            14 => Some(Self::JobList),
            21 => Some(Self::NdataPut),
            22 => Some(Self::NdataGet),
            23 => Some(Self::NdataDel),
            _ => None,
        }
    }

    /// The wire tag for this bundle type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for the broker-discovery range (1-10).
    pub fn is_discovery(self) -> bool {
        matches!(self, Self::BrokerAnnounce | Self::BrokerRequest | Self::BrokerAck)
    }

    /// True for the job range (11-20).
    pub fn is_job(self) -> bool {
        matches!(
            self,
            Self::JobSubmit | Self::JobResult | Self::JobQuery | Self::JobList
        )
    }

    /// True for the named-data range (21-30).
    pub fn is_named_data(self) -> bool {
        matches!(self, Self::NdataPut | Self::NdataGet | Self::NdataDel)
    }
}

/// One name or a list of names referenced by a named-data bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedData {
    /// A single name.
    One(String),
    /// Several names.
    Many(Vec<String>),
}

impl NamedData {
    /// All referenced names, in order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// The first referenced name, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(name) => Some(name.as_str()),
            Self::Many(names) => names.first().map(String::as_str),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::One(name) => name.is_empty(),
            Self::Many(names) => names.is_empty(),
        }
    }
}

impl From<&str> for NamedData {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for NamedData {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for NamedData {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

/// An immutable protocol record carried as a bundle payload.
///
/// Instances only come out of [`BundleData::build`] or wire decoding,
/// both of which run the same validation; a `BundleData` in hand is
/// structurally valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleData {
    kind: BundleType,
    source: Eid,
    destination: Eid,
    payload: Bytes,
    success: bool,
    error: String,
    node_type: Option<NodeType>,
    submitter: Option<Eid>,
    named_data: Option<NamedData>,
}

impl BundleData {
    /// Starts building a bundle of the given type and addressing.
    pub fn build(kind: BundleType, source: Eid, destination: Eid) -> BundleBuilder {
        BundleBuilder {
            inner: BundleData {
                kind,
                source,
                destination,
                payload: Bytes::new(),
                success: true,
                error: String::new(),
                node_type: None,
                submitter: None,
                named_data: None,
            },
        }
    }

    /// The bundle type.
    pub fn kind(&self) -> BundleType {
        self.kind
    }

    /// Who sent the bundle.
    pub fn source(&self) -> &Eid {
        &self.source
    }

    /// Who the bundle is addressed to.
    pub fn destination(&self) -> &Eid {
        &self.destination
    }

    /// The opaque payload, possibly empty.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Whether the operation the bundle reports succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// The error text; non-empty exactly when the bundle is a failure.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// The sender's role; present on discovery bundles.
    pub fn node_type(&self) -> Option<NodeType> {
        self.node_type
    }

    /// The job submitter; present on job query/list bundles.
    pub fn submitter(&self) -> Option<&Eid> {
        self.submitter.as_ref()
    }

    /// The referenced names; present on named-data bundles.
    pub fn named_data(&self) -> Option<&NamedData> {
        self.named_data.as_ref()
    }

    fn validate(&self) -> Result<()> {
        if self.source.is_null() {
            return Err(ProtoError::MalformedBundle(
                "bundles must be sent by someone".to_string(),
            ));
        }
        if self.destination.is_null() {
            return Err(ProtoError::MalformedBundle(
                "bundles must be addressed to someone".to_string(),
            ));
        }
        if !self.success && self.error.is_empty() {
            return Err(ProtoError::MalformedBundle(
                "an unsuccessful bundle needs an error".to_string(),
            ));
        }
        if self.success && !self.error.is_empty() {
            return Err(ProtoError::MalformedBundle(
                "a successful bundle cannot carry an error".to_string(),
            ));
        }
        if self.kind.is_discovery() && self.node_type.is_none() {
            return Err(ProtoError::MalformedBundle(
                "discovery bundles need a node type".to_string(),
            ));
        }
        if matches!(self.kind, BundleType::JobQuery | BundleType::JobList)
            && !self.submitter.as_ref().is_some_and(|eid| !eid.is_null())
        {
            return Err(ProtoError::MalformedBundle(
                "job query/list bundles need a submitter".to_string(),
            ));
        }
        if self.kind.is_named_data()
            && !self.named_data.as_ref().is_some_and(|names| !names.is_empty())
        {
            return Err(ProtoError::MalformedBundle(
                "named-data bundles need a data name".to_string(),
            ));
        }
        Ok(())
    }

    /// Wire form: a map holding the non-falsy fields, `success` always.
    pub(crate) fn to_value(&self) -> Value {
        let mut map: Vec<(Value, Value)> = vec![
            ("type".into(), u64::from(self.kind.as_u8()).into()),
            ("source".into(), self.source.as_str().into()),
            ("destination".into(), self.destination.as_str().into()),
        ];
        if !self.payload.is_empty() {
            map.push(("payload".into(), Value::Binary(self.payload.to_vec())));
        }
        map.push(("success".into(), self.success.into()));
        if !self.error.is_empty() {
            map.push(("error".into(), self.error.as_str().into()));
        }
        if let Some(node_type) = self.node_type {
            map.push(("node_type".into(), u64::from(node_type.as_u8()).into()));
        }
        if let Some(submitter) = &self.submitter {
            if !submitter.is_null() {
                map.push(("submitter".into(), submitter.as_str().into()));
            }
        }
        if let Some(named_data) = &self.named_data {
            let value = match named_data {
                NamedData::One(name) => name.as_str().into(),
                NamedData::Many(names) => Value::Array(
                    names.iter().map(|name| name.as_str().into()).collect(),
                ),
            };
            map.push(("named_data".into(), value));
        }
        Value::Map(map)
    }

    pub(crate) fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_map()
            .ok_or_else(|| ProtoError::MalformedBundle("bundle must be a map".to_string()))?;

        let tag = wire::get_u64(map, "type")
            .ok_or_else(|| ProtoError::MalformedBundle("bundle type missing".to_string()))?;
        let kind = u8::try_from(tag)
            .ok()
            .and_then(BundleType::from_u8)
            .ok_or_else(|| ProtoError::MalformedBundle(format!("unsupported bundle type: {tag}")))?;

        let source = wire::get_str(map, "source")
            .map(Eid::new)
            .ok_or_else(|| ProtoError::MalformedBundle("bundle source missing".to_string()))?;
        let destination = wire::get_str(map, "destination")
            .map(Eid::new)
            .ok_or_else(|| ProtoError::MalformedBundle("bundle destination missing".to_string()))?;

        let payload = wire::get(map, "payload")
            .and_then(Value::as_slice)
            .map(Bytes::copy_from_slice)
            .unwrap_or_default();
        let success = wire::get_bool(map, "success").unwrap_or(true);
        let error = wire::get_str(map, "error").unwrap_or_default().to_string();

        let node_type = match wire::get(map, "node_type") {
            None => None,
            Some(value) => {
                let tag = value.as_u64().ok_or_else(|| {
                    ProtoError::MalformedBundle(format!("invalid node type: {value}"))
                })?;
                let node_type = u8::try_from(tag)
                    .ok()
                    .and_then(NodeType::from_u8)
                    .ok_or_else(|| {
                        ProtoError::MalformedBundle(format!("invalid node type: {tag}"))
                    })?;
                Some(node_type)
            }
        };

        let submitter = wire::get_str(map, "submitter").map(Eid::new);

        let named_data = match wire::get(map, "named_data") {
            None => None,
            Some(Value::Array(items)) => {
                let names = items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            ProtoError::MalformedBundle("data names must be strings".to_string())
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Some(NamedData::Many(names))
            }
            Some(value) => {
                let name = value.as_str().ok_or_else(|| {
                    ProtoError::MalformedBundle("data names must be strings".to_string())
                })?;
                Some(NamedData::One(name.to_string()))
            }
        };

        let bundle = BundleData {
            kind,
            source,
            destination,
            payload,
            success,
            error,
            node_type,
            submitter,
            named_data,
        };
        bundle.validate()?;
        Ok(bundle)
    }
}

/// Builder returned by [`BundleData::build`]; `finish` is the
/// validation gate.
#[derive(Debug)]
pub struct BundleBuilder {
    inner: BundleData,
}

impl BundleBuilder {
    /// Sets the payload bytes.
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.inner.payload = payload.into();
        self
    }

    /// Marks the bundle as reporting success or failure.
    pub fn success(mut self, success: bool) -> Self {
        self.inner.success = success;
        self
    }

    /// Sets the error text.
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.inner.error = error.into();
        self
    }

    /// Sets the sender's role tag.
    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.inner.node_type = Some(node_type);
        self
    }

    /// Sets the job submitter.
    pub fn submitter(mut self, submitter: Eid) -> Self {
        self.inner.submitter = Some(submitter);
        self
    }

    /// Sets the referenced data names.
    pub fn named_data(mut self, named_data: impl Into<NamedData>) -> Self {
        self.inner.named_data = Some(named_data.into());
        self
    }

    /// Validates and produces the bundle.
    pub fn finish(self) -> Result<BundleData> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
