//! Fuzz target for directory alias key decoding
//!
//! Directory keys come back off disk, so the decoder must survive
//! arbitrary byte sequences: wrong lengths, wrong prefixes, any key
//! material. It should also round-trip every key it accepts.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mixchat_store::{decode_alias_key, encode_alias_key};

fuzz_target!(|data: &[u8]| {
    if let Ok(identity) = decode_alias_key(data) {
        // Anything that decodes must re-encode to the same bytes
        assert_eq!(encode_alias_key(&identity).as_slice(), data);
    }
});
