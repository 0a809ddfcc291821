//! Fuzz target for job description parsing.
//!
//! Tests that description text and job-board payloads are rejected
//! cleanly rather than panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = courier_job::JobInfo::loads(text);
        let _ = courier_job::Capabilities::loads(text);
    }
    let _ = courier_proto::unpack_job_board(data);
});
