#![no_main]

//! Sniffs and decodes arbitrary bytes with and without WebP alpha
//! verification. Errors are expected; panics are not.

use dimsniff::{DecodeOptions, FormatRegistry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let _ = dimsniff::decode_bytes(data);

    let options = DecodeOptions::new()
        .with_verify_alpha(true)
        .with_max_chunk_size(64);
    let _ = FormatRegistry::with_options(&options).decode_size(data);
});
