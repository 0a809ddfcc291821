//! Endpoint identifiers for the bundle network.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The null endpoint, used where no address is known.
const NONE: &str = "dtn:none";

/// An endpoint identifier addressing a node or node-group.
///
/// The textual scheme is `dtn://node/service`. An EID is an immutable
/// value; equality and hashing are over the normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Eid(String);

impl Eid {
    /// Creates an EID from its textual form.
    ///
    /// A `dtn://node` form without a service separator is normalized
    /// to `dtn://node/`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        if let Some(rest) = text.strip_prefix("dtn://") {
            if !rest.contains('/') {
                return Self(format!("dtn://{rest}/"));
            }
        }
        Self(text)
    }

    /// Creates a singleton EID `dtn://node/service`.
    pub fn dtn(node: &str, service: &str) -> Self {
        Self(format!("dtn://{node}/{service}"))
    }

    /// The null EID, `dtn:none`.
    pub fn none() -> Self {
        Self(NONE.to_string())
    }

    /// The distinguished broadcast address every node announces to.
    ///
    /// The `~` prefix marks the service as a group, so the broadcast
    /// address is never equal to a constructed singleton EID.
    pub fn broadcast() -> Self {
        Self::dtn("broadcast", "~nodes")
    }

    /// Returns the normalized textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The node component, or `""` for non-`dtn://` addresses.
    pub fn node_name(&self) -> &str {
        match self.0.strip_prefix("dtn://") {
            Some(rest) => rest.split('/').next().unwrap_or(""),
            None => "",
        }
    }

    /// The service component (the part after the node), or `""`.
    pub fn service(&self) -> &str {
        match self.0.strip_prefix("dtn://") {
            Some(rest) => rest.split_once('/').map(|(_, s)| s).unwrap_or(""),
            None => "",
        }
    }

    /// True for the null EID and for anything without a node component.
    ///
    /// A null EID is invalid wherever an address is required.
    pub fn is_null(&self) -> bool {
        self.0 == NONE || self.node_name().is_empty()
    }

    /// True unless the service component is marked as a group (`~` prefix).
    pub fn is_singleton(&self) -> bool {
        !self.service().starts_with('~')
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Eid {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl Serialize for Eid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Eid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.is_empty() {
            return Err(D::Error::custom("empty endpoint identifier"));
        }
        Ok(Self::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtn_constructor() {
        let eid = Eid::dtn("relay", "ingest");
        assert_eq!(eid.as_str(), "dtn://relay/ingest");
        assert_eq!(eid.node_name(), "relay");
        assert_eq!(eid.service(), "ingest");
    }

    #[test]
    fn bare_node_is_normalized() {
        assert_eq!(Eid::new("dtn://relay").as_str(), "dtn://relay/");
        assert_eq!(Eid::new("dtn://relay"), Eid::dtn("relay", ""));
    }

    #[test]
    fn null_detection() {
        assert!(Eid::none().is_null());
        assert!(Eid::dtn("", "").is_null());
        assert!(!Eid::dtn("relay", "").is_null());
    }

    #[test]
    fn broadcast_is_a_group_address() {
        let broadcast = Eid::broadcast();
        assert!(!broadcast.is_singleton());
        assert!(!broadcast.is_null());
        assert_ne!(broadcast, Eid::dtn("broadcast", "nodes"));
    }

    #[test]
    fn singleton_classification() {
        assert!(Eid::dtn("relay", "ingest").is_singleton());
        assert!(!Eid::dtn("relay", "~fanout").is_singleton());
    }
}
