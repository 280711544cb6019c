//! Fuzz target for polygon label file parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the label parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelrecon::mask::from_label_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_label_slice(data);
});
