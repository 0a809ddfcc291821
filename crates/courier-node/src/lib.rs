//! # Courier Node
//!
//! The node runtime: discovery, role behavior, and the client for the
//! local bundle-transport agent.
//!
//! Every node, whatever its role, runs the same three periodic loops:
//! announce presence, drain newly arrived bundles, and a role tick.
//! Roles differ only in how they answer bundles and what the tick does.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod broker;
mod client;
mod config;
mod context;
mod datastore;
mod error;
mod executor;
mod node;
mod role;
mod scheduler;

pub use agent::AgentClient;
pub use broker::Broker;
pub use client::Client;
pub use config::Config;
pub use context::{Context, DiscoveryState, NodeState};
pub use datastore::Datastore;
pub use error::{NodeError, Result};
pub use executor::Executor;
pub use node::Node;
pub use role::Role;
pub use scheduler::{Assignment, NoopScheduler, Scheduler};
