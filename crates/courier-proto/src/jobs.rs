//! Wire form of the broker's job board, carried in `JobList` payloads.

use crate::{wire, ProtoError, Result};
use courier_job::{Capabilities, JobInfo};
use courier_types::Eid;
use rmpv::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The jobs a broker currently holds, split by state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobBoard {
    /// Jobs that have finished.
    pub completed: Vec<JobInfo>,
    /// Jobs waiting for placement, in queue order.
    pub queued: Vec<JobInfo>,
}

/// Packs a job board into a `JobList` payload.
pub fn pack_job_board(board: &JobBoard) -> Result<Vec<u8>> {
    let value = Value::Map(vec![
        (
            "completed".into(),
            Value::Array(board.completed.iter().map(job_to_value).collect()),
        ),
        (
            "queued".into(),
            Value::Array(board.queued.iter().map(job_to_value).collect()),
        ),
    ]);
    wire::to_bytes(&value)
}

/// Unpacks a job board from a `JobList` payload.
pub fn unpack_job_board(bytes: &[u8]) -> Result<JobBoard> {
    let value = wire::from_bytes(bytes)?;
    let map = value
        .as_map()
        .ok_or_else(|| ProtoError::MalformedBundle("job list must be a map".to_string()))?;
    Ok(JobBoard {
        completed: jobs_from(map, "completed")?,
        queued: jobs_from(map, "queued")?,
    })
}

fn jobs_from(map: &[(Value, Value)], key: &str) -> Result<Vec<JobInfo>> {
    wire::get(map, key)
        .and_then(Value::as_array)
        .ok_or_else(|| ProtoError::MalformedBundle(format!("job list {key} jobs missing")))?
        .iter()
        .map(job_from_value)
        .collect()
}

fn push_str(map: &mut Vec<(Value, Value)>, key: &str, value: &str) {
    if !value.is_empty() {
        map.push((key.into(), value.into()));
    }
}

fn push_list(map: &mut Vec<(Value, Value)>, key: &str, values: &[String]) {
    if !values.is_empty() {
        map.push((
            key.into(),
            Value::Array(values.iter().map(|item| item.as_str().into()).collect()),
        ));
    }
}

fn push_table(map: &mut Vec<(Value, Value)>, key: &str, table: &BTreeMap<String, String>) {
    if !table.is_empty() {
        map.push((
            key.into(),
            Value::Map(
                table
                    .iter()
                    .map(|(k, v)| (k.as_str().into(), v.as_str().into()))
                    .collect(),
            ),
        ));
    }
}

fn caps_to_value(caps: &Capabilities) -> Value {
    let mut map: Vec<(Value, Value)> = vec![("cpu_cores".into(), caps.cpu_cores.into())];
    if caps.free_cpu_capacity != 0 {
        map.push(("free_cpu_capacity".into(), caps.free_cpu_capacity.into()));
    }
    if caps.free_memory != 0 {
        map.push(("free_memory".into(), caps.free_memory.into()));
    }
    if caps.free_disk_space != 0 {
        map.push(("free_disk_space".into(), caps.free_disk_space.into()));
    }
    Value::Map(map)
}

fn caps_from_value(value: &Value) -> Result<Capabilities> {
    let map = value
        .as_map()
        .ok_or_else(|| ProtoError::MalformedBundle("capabilities must be a map".to_string()))?;
    Ok(Capabilities {
        cpu_cores: wire::get_u64(map, "cpu_cores").unwrap_or(1),
        free_cpu_capacity: wire::get_u64(map, "free_cpu_capacity").unwrap_or(0),
        free_memory: wire::get_u64(map, "free_memory").unwrap_or(0),
        free_disk_space: wire::get_u64(map, "free_disk_space").unwrap_or(0),
    })
}

fn job_to_value(job: &JobInfo) -> Value {
    let mut map: Vec<(Value, Value)> =
        vec![("job_id".into(), job.job_id.to_string().into())];
    if !job.submitter.is_null() {
        map.push(("submitter".into(), job.submitter.as_str().into()));
    }
    map.push(("wasm_module".into(), job.wasm_module.as_str().into()));
    if let Some(receiver) = &job.results_receiver {
        if !receiver.is_null() {
            map.push(("results_receiver".into(), receiver.as_str().into()));
        }
    }
    push_list(&mut map, "argv", &job.argv);
    push_str(&mut map, "stdin_file", job.stdin_file.as_deref().unwrap_or(""));
    push_list(&mut map, "dirs", &job.dirs);
    push_str(&mut map, "stdout_file", job.stdout_file.as_deref().unwrap_or(""));
    push_str(&mut map, "stderr_file", job.stderr_file.as_deref().unwrap_or(""));
    push_list(&mut map, "results", &job.results);
    map.push(("capabilities".into(), caps_to_value(&job.capabilities)));
    push_table(&mut map, "env", &job.env);
    push_table(&mut map, "data", &job.data);
    push_table(&mut map, "named_results", &job.named_results);
    Value::Map(map)
}

fn job_from_value(value: &Value) -> Result<JobInfo> {
    let map = value
        .as_map()
        .ok_or_else(|| ProtoError::MalformedBundle("job description must be a map".to_string()))?;

    let job_id = wire::get_str(map, "job_id")
        .ok_or_else(|| ProtoError::MalformedBundle("job id missing".to_string()))?;
    let job_id = Uuid::parse_str(job_id)
        .map_err(|err| ProtoError::MalformedBundle(format!("invalid job id: {err}")))?;

    let wasm_module = wire::get_str(map, "wasm_module")
        .ok_or_else(|| ProtoError::MalformedBundle("job executable missing".to_string()))?
        .to_string();

    let capabilities = match wire::get(map, "capabilities") {
        Some(value) => caps_from_value(value)?,
        None => Capabilities::default(),
    };

    Ok(JobInfo {
        job_id,
        submitter: wire::get_str(map, "submitter").map(Eid::new).unwrap_or_else(Eid::none),
        wasm_module,
        results_receiver: wire::get_str(map, "results_receiver").map(Eid::new),
        argv: list_from(map, "argv")?,
        stdin_file: wire::get_str(map, "stdin_file").map(str::to_string),
        dirs: list_from(map, "dirs")?,
        stdout_file: wire::get_str(map, "stdout_file").map(str::to_string),
        stderr_file: wire::get_str(map, "stderr_file").map(str::to_string),
        results: list_from(map, "results")?,
        capabilities,
        env: table_from(map, "env")?,
        data: table_from(map, "data")?,
        named_results: table_from(map, "named_results")?,
    })
}

fn list_from(map: &[(Value, Value)], key: &str) -> Result<Vec<String>> {
    match wire::get(map, key) {
        None => Ok(Vec::new()),
        Some(value) => value
            .as_array()
            .ok_or_else(|| ProtoError::MalformedBundle(format!("job {key} must be a list")))?
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ProtoError::MalformedBundle(format!("job {key} entries must be strings"))
                })
            })
            .collect(),
    }
}

fn table_from(map: &[(Value, Value)], key: &str) -> Result<BTreeMap<String, String>> {
    match wire::get(map, key) {
        None => Ok(BTreeMap::new()),
        Some(value) => value
            .as_map()
            .ok_or_else(|| ProtoError::MalformedBundle(format!("job {key} must be a map")))?
            .iter()
            .map(|(k, v)| match (k.as_str(), v.as_str()) {
                (Some(k), Some(v)) => Ok((k.to_string(), v.to_string())),
                _ => Err(ProtoError::MalformedBundle(format!(
                    "job {key} entries must be strings"
                ))),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job(module: &str) -> JobInfo {
        JobInfo {
            job_id: Uuid::new_v4(),
            submitter: Eid::dtn("client", ""),
            wasm_module: module.to_string(),
            results_receiver: Some(Eid::dtn("client", "results")),
            argv: vec!["--fast".to_string()],
            stdin_file: None,
            dirs: vec!["/scratch".to_string()],
            stdout_file: Some("/scratch/out".to_string()),
            stderr_file: None,
            results: vec!["/scratch/out".to_string()],
            capabilities: Capabilities {
                cpu_cores: 2,
                free_cpu_capacity: 150,
                free_memory: 1024,
                free_disk_space: 2048,
            },
            env: BTreeMap::from([("MODE".to_string(), "batch".to_string())]),
            data: BTreeMap::from([("/scratch/in".to_string(), "input".to_string())]),
            named_results: BTreeMap::new(),
        }
    }

    #[test]
    fn board_roundtrip() {
        let board = JobBoard {
            completed: vec![sample_job("done")],
            queued: vec![sample_job("first"), sample_job("second")],
        };
        let unpacked = unpack_job_board(&pack_job_board(&board).unwrap()).unwrap();
        assert_eq!(unpacked, board);
    }

    #[test]
    fn empty_board_roundtrip() {
        let board = JobBoard::default();
        let unpacked = unpack_job_board(&pack_job_board(&board).unwrap()).unwrap();
        assert_eq!(unpacked, board);
    }

    #[test]
    fn minimal_job_gets_defaults_back() {
        let job = JobInfo {
            job_id: Uuid::new_v4(),
            submitter: Eid::none(),
            wasm_module: "module".to_string(),
            results_receiver: None,
            argv: Vec::new(),
            stdin_file: None,
            dirs: Vec::new(),
            stdout_file: None,
            stderr_file: None,
            results: Vec::new(),
            capabilities: Capabilities::default(),
            env: BTreeMap::new(),
            data: BTreeMap::new(),
            named_results: BTreeMap::new(),
        };
        let board = JobBoard {
            completed: Vec::new(),
            queued: vec![job.clone()],
        };
        let unpacked = unpack_job_board(&pack_job_board(&board).unwrap()).unwrap();
        assert_eq!(unpacked.queued, vec![job]);
    }

    #[test]
    fn garbage_payload_is_rejected() {
        assert!(unpack_job_board(b"not msgpack at all").is_err());
    }
}
