//! Fuzz target for cache key decoding
//!
//! Cache keys are length-prefixed strings; the decoder must survive
//! arbitrary text: missing or lying length prefixes, split points landing
//! inside multi-byte UTF-8, and garbage base64.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mixchat_client::decode_cache_key;

fuzz_target!(|text: &str| {
    // This should never panic, only return Err for invalid input
    let _ = decode_cache_key(text);
});
