//! Fuzz target for endpoint identifier normalization.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let eid = courier_types::Eid::new(text);
        let _ = eid.node_name();
        let _ = eid.service();
        let _ = eid.is_null();
        let _ = eid.is_singleton();
    }
});
