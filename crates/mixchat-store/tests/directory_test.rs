//! Directory contract tests.
//!
//! Runs the same scenarios against both backends so the in-memory
//! implementation used in simulation cannot drift from the durable one.

use mixchat_proto::Identity;
use mixchat_store::{
    AliasDirectory, AliasRecord, MemoryDirectory, RedbDirectory, decode_alias_key,
    encode_alias_key,
};
use proptest::prelude::*;
use tempfile::tempdir;

fn identity(peer: u8, provider: u8) -> Identity {
    Identity::from_bytes(&[peer; 32], &[provider; 32]).unwrap()
}

/// Upsert then read back; overwrite leaves exactly one record.
fn check_put_idempotence<D: AliasDirectory>(directory: &D) {
    let id = identity(1, 2);

    directory.put(&id, "bob").unwrap();
    directory.put(&id, "bob").unwrap();

    let records = directory.list_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0], AliasRecord { name: "bob".to_string(), identity: id });
}

/// Absence is an empty-named record, not an error.
fn check_absent_is_empty_record<D: AliasDirectory>(directory: &D) {
    let id = identity(3, 4);
    let record = directory.get(&id).unwrap();
    assert_eq!(record.name, "");
    assert_eq!(record.identity, id);
}

/// `remove all` leaves an empty namespace.
fn check_remove_all<D: AliasDirectory>(directory: &D) {
    directory.put(&identity(1, 1), "a").unwrap();
    directory.put(&identity(2, 2), "b").unwrap();
    directory.put(&identity(3, 3), "c").unwrap();

    directory.remove_all().unwrap();
    assert!(directory.list_all().unwrap().is_empty());
}

/// Enumeration sorts by peer key bytes, then provider key bytes.
fn check_list_order<D: AliasDirectory>(directory: &D) {
    directory.put(&identity(2, 1), "third").unwrap();
    directory.put(&identity(1, 2), "second").unwrap();
    directory.put(&identity(1, 1), "first").unwrap();

    let names: Vec<_> = directory.list_all().unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

/// Name filtering is exact-match only.
fn check_list_by_name<D: AliasDirectory>(directory: &D) {
    directory.put(&identity(1, 1), "bob").unwrap();
    directory.put(&identity(2, 2), "bob").unwrap();
    directory.put(&identity(3, 3), "alice").unwrap();

    assert_eq!(directory.list_by_name("bob").unwrap().len(), 2);
    assert_eq!(directory.list_by_name("alice").unwrap().len(), 1);
    assert!(directory.list_by_name("bo").unwrap().is_empty());
    assert!(directory.list_by_name("").unwrap().is_empty());
}

#[test]
fn memory_directory_contract() {
    check_put_idempotence(&MemoryDirectory::new());
    check_absent_is_empty_record(&MemoryDirectory::new());
    check_remove_all(&MemoryDirectory::new());
    check_list_order(&MemoryDirectory::new());
    check_list_by_name(&MemoryDirectory::new());
}

#[test]
fn redb_directory_contract() {
    let dir = tempdir().unwrap();
    let open = |name: &str| RedbDirectory::open(dir.path().join(name)).unwrap();

    check_put_idempotence(&open("a.redb"));
    check_absent_is_empty_record(&open("b.redb"));
    check_remove_all(&open("c.redb"));
    check_list_order(&open("d.redb"));
    check_list_by_name(&open("e.redb"));
}

#[test]
fn prop_alias_key_roundtrip() {
    proptest!(|(peer in proptest::array::uniform32(any::<u8>()),
                provider in proptest::array::uniform32(any::<u8>()))| {
        let id = Identity::from_bytes(&peer, &provider).expect("fixed-size input");
        let key = encode_alias_key(&id);

        // PROPERTY: Round-trip must be identity
        prop_assert_eq!(decode_alias_key(&key).expect("decode should succeed"), id);
    });
}

#[test]
fn prop_decode_arbitrary_keys_never_panics() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..128))| {
        // Arbitrary input may or may not decode, but must never panic.
        let _ = decode_alias_key(&bytes);
    });
}
