//! Node roles.

use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role a node plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    /// Rendezvous point: mediates discovery and job placement.
    Broker = 1,
    /// Runs job payloads on behalf of submitters.
    Executor = 2,
    /// Holds named, content-addressed blobs.
    Datastore = 3,
    /// Submits jobs and queries their status.
    Client = 4,
}

impl NodeType {
    /// Parses a role from its wire tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Broker),
            2 => Some(Self::Executor),
            3 => Some(Self::Datastore),
            4 => Some(Self::Client),
            _ => None,
        }
    }

    /// The wire tag for this role.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// All roles, in tag order.
    pub fn all() -> [NodeType; 4] {
        [Self::Broker, Self::Executor, Self::Datastore, Self::Client]
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Broker => "broker",
            Self::Executor => "executor",
            Self::Datastore => "datastore",
            Self::Client => "client",
        };
        f.write_str(name)
    }
}

impl FromStr for NodeType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broker" => Ok(Self::Broker),
            "executor" => Ok(Self::Executor),
            "datastore" => Ok(Self::Datastore),
            "client" => Ok(Self::Client),
            other => Err(TypeError::UnknownService(other.to_string())),
        }
    }
}
