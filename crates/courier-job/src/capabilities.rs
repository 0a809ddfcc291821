//! Resource capability vectors.

use crate::Result;
use serde::{Deserialize, Serialize};

fn default_cpu_cores() -> u64 {
    1
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// A resource vector used for admission comparison.
///
/// The same type describes both what a system currently has to offer
/// and what a job requires. Zero-valued fields are omitted from the
/// serialized form and restored as defaults on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    /// Number of CPU cores, at least 1.
    #[serde(default = "default_cpu_cores")]
    pub cpu_cores: u64,
    /// Aggregate spare CPU as a percentage-equivalent: cores x (100 - busy%).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub free_cpu_capacity: u64,
    /// Available memory in bytes.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub free_memory: u64,
    /// Free disk space in bytes.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub free_disk_space: u64,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            cpu_cores: 1,
            free_cpu_capacity: 0,
            free_memory: 0,
            free_disk_space: 0,
        }
    }
}

impl Capabilities {
    /// Builds a capability vector from a live resource snapshot.
    ///
    /// The snapshot is supplied by the caller; this only derives the
    /// spare-CPU aggregate from the busy percentage.
    pub fn from_snapshot(
        cpu_cores: u64,
        cpu_busy_percent: f64,
        available_memory: u64,
        free_disk: u64,
    ) -> Self {
        let free_cpu_capacity = (cpu_cores as f64 * (100.0 - cpu_busy_percent)) as u64;
        Self {
            cpu_cores,
            free_cpu_capacity,
            free_memory: available_memory,
            free_disk_space: free_disk,
        }
    }

    /// True iff every field meets or exceeds the required field.
    ///
    /// No partial credit, no weighting; a value is always capable of
    /// itself.
    pub fn is_capable_of(&self, required: &Capabilities) -> bool {
        self.cpu_cores >= required.cpu_cores
            && self.free_cpu_capacity >= required.free_cpu_capacity
            && self.free_memory >= required.free_memory
            && self.free_disk_space >= required.free_disk_space
    }

    /// Renders the vector as description text.
    ///
    /// The output is deterministic: repeated calls on the same value
    /// produce byte-identical text.
    pub fn dumps(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Parses a vector from description text.
    pub fn loads(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
