//! Fuzz target for ChatMessage::decode
//!
//! This fuzzer tests message decoding with arbitrary byte sequences to find:
//! - Parser crashes or panics
//! - Malformed CBOR that bypasses validation
//! - Oversized strings or collections
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mixchat_proto::ChatMessage;

fuzz_target!(|data: &[u8]| {
    // Attempt to decode arbitrary bytes as a chat message
    // This should never panic, only return Err for invalid data
    let _ = ChatMessage::decode(data);
});
