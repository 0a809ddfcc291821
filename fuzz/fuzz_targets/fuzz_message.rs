//! Fuzz target for local-agent message decoding.
//!
//! Tests that the message decoder handles arbitrary input without
//! panicking, including the nested bundle validation path.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = courier_proto::deserialize(data);
});
