//! Job descriptions and readiness checks.

use crate::{Capabilities, Result};
use courier_types::Eid;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

fn absent_str(value: &Option<String>) -> bool {
    match value {
        None => true,
        Some(s) => s.is_empty(),
    }
}

fn absent_receiver(value: &Option<Eid>) -> bool {
    match value {
        None => true,
        Some(eid) => eid.is_null(),
    }
}

/// A job description: what to run, what it needs, and where results go.
///
/// Falsy fields are omitted from the serialized description and restored
/// as defaults on load. Maps are ordered so that `dumps` is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobInfo {
    /// Unique job identifier.
    pub job_id: Uuid,
    /// Who submitted the job; the null EID when unknown.
    #[serde(default = "Eid::none", skip_serializing_if = "Eid::is_null")]
    pub submitter: Eid,
    /// Name of the executable blob.
    pub wasm_module: String,
    /// Where to send results, if anywhere.
    #[serde(default, skip_serializing_if = "absent_receiver")]
    pub results_receiver: Option<Eid>,
    /// Command-line arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub argv: Vec<String>,
    /// Named-data reference fed to standard input, if any.
    #[serde(default, skip_serializing_if = "absent_str")]
    pub stdin_file: Option<String>,
    /// Directories to create before the job runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dirs: Vec<String>,
    /// Path capturing standard output.
    #[serde(default, skip_serializing_if = "absent_str")]
    pub stdout_file: Option<String>,
    /// Path capturing standard error.
    #[serde(default, skip_serializing_if = "absent_str")]
    pub stderr_file: Option<String>,
    /// Output paths expected after the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<String>,
    /// Resources a worker must offer to admit the job.
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Environment variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Destination path -> named-data reference to place there.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Output path -> name under which to publish it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named_results: BTreeMap<String, String>,
}

impl JobInfo {
    /// Renders the description text.
    ///
    /// Deterministic: repeated calls on the same value produce
    /// byte-identical text.
    pub fn dumps(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Parses a description from text.
    pub fn loads(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Every named-data reference the job needs, de-duplicated.
    ///
    /// The executable blob, the stdin reference (if set), and all
    /// data-file references.
    pub fn required_named_data(&self) -> HashSet<String> {
        let mut required: HashSet<String> = HashSet::new();
        required.insert(self.wasm_module.clone());
        if let Some(stdin) = &self.stdin_file {
            if !stdin.is_empty() {
                required.insert(stdin.clone());
            }
        }
        required.extend(self.data.values().cloned());
        required
    }
}

/// A job description paired with the data already resolved for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The description.
    pub info: JobInfo,
    /// Resolved named data, by name. Extra entries are ignored.
    pub data: HashMap<String, Vec<u8>>,
}

impl Job {
    /// Creates a job from a description and the data resolved so far.
    pub fn new(info: JobInfo, data: HashMap<String, Vec<u8>>) -> Self {
        Self { info, data }
    }

    /// Which required references have not been resolved yet.
    pub fn missing_data(&self) -> HashSet<String> {
        self.info
            .required_named_data()
            .into_iter()
            .filter(|name| !self.data.contains_key(name))
            .collect()
    }

    /// True once every required reference is resolved.
    pub fn has_all_data(&self) -> bool {
        self.missing_data().is_empty()
    }
}
