#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use mixchat_proto::Identity;

use crate::{AliasDirectory, AliasRecord, DirectoryError, decode_alias_key, encode_alias_key};

/// In-memory directory implementation for testing and simulation.
///
/// Uses a `BTreeMap` keyed by the encoded directory key so enumeration
/// order matches the durable backend (key byte order). State is wrapped in
/// Arc<Mutex<>> to allow Clone and concurrent access. Thread-safe through
/// Mutex, but uses `lock().expect()` which will panic if the mutex is
/// poisoned - acceptable for test code.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    entries: Arc<Mutex<BTreeMap<Vec<u8>, String>>>,
}

impl MemoryDirectory {
    /// Create a new empty `MemoryDirectory`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    ///
    /// Useful for debugging and testing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned (a thread panicked while
    /// holding the lock). This is acceptable for test/simulation code.
    #[allow(clippy::expect_used)]
    pub fn record_count(&self) -> usize {
        self.entries.lock().expect("Mutex poisoned").len()
    }
}

impl AliasDirectory for MemoryDirectory {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn put(&self, identity: &Identity, name: &str) -> Result<(), DirectoryError> {
        let key = encode_alias_key(identity);
        self.entries.lock().expect("Mutex poisoned").insert(key.to_vec(), name.to_string());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn get(&self, identity: &Identity) -> Result<AliasRecord, DirectoryError> {
        let key = encode_alias_key(identity);
        let entries = self.entries.lock().expect("Mutex poisoned");

        Ok(match entries.get(key.as_slice()) {
            Some(name) => AliasRecord { name: name.clone(), identity: *identity },
            None => AliasRecord::unset(*identity),
        })
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn remove(&self, identity: &Identity) -> Result<(), DirectoryError> {
        let key = encode_alias_key(identity);
        self.entries.lock().expect("Mutex poisoned").remove(key.as_slice());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn list_all(&self) -> Result<Vec<AliasRecord>, DirectoryError> {
        let entries = self.entries.lock().expect("Mutex poisoned");

        // BTreeMap iteration is key byte order, matching the redb backend.
        let mut records = Vec::with_capacity(entries.len());
        for (key, name) in entries.iter() {
            match decode_alias_key(key) {
                Ok(identity) => records.push(AliasRecord { name: name.clone(), identity }),
                Err(e) => {
                    tracing::warn!("skipping undecodable alias key: {e}");
                },
            }
        }

        Ok(records)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test code.
    #[allow(clippy::expect_used)]
    fn remove_all(&self) -> Result<(), DirectoryError> {
        self.entries.lock().expect("Mutex poisoned").clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(peer: u8, provider: u8) -> Identity {
        Identity::from_bytes(&[peer; 32], &[provider; 32]).unwrap()
    }

    #[test]
    fn test_new_directory_is_empty() {
        let directory = MemoryDirectory::new();
        assert_eq!(directory.record_count(), 0);
        assert!(directory.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_put_get_remove() {
        let directory = MemoryDirectory::new();
        let id = identity(1, 2);

        directory.put(&id, "alice").unwrap();
        assert_eq!(directory.get(&id).unwrap().name, "alice");

        directory.remove(&id).unwrap();
        assert_eq!(directory.get(&id).unwrap(), AliasRecord::unset(id));
    }

    #[test]
    fn test_clones_share_state() {
        let directory = MemoryDirectory::new();
        let clone = directory.clone();

        directory.put(&identity(1, 2), "shared").unwrap();
        assert_eq!(clone.get(&identity(1, 2)).unwrap().name, "shared");
    }

    #[test]
    fn test_list_all_key_byte_order() {
        let directory = MemoryDirectory::new();

        directory.put(&identity(9, 0), "last").unwrap();
        directory.put(&identity(1, 1), "first").unwrap();
        directory.put(&identity(1, 5), "second").unwrap();

        let names: Vec<_> =
            directory.list_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["first", "second", "last"]);
    }

    #[test]
    fn test_remove_all() {
        let directory = MemoryDirectory::new();

        directory.put(&identity(1, 1), "a").unwrap();
        directory.put(&identity(2, 2), "b").unwrap();
        directory.remove_all().unwrap();

        assert_eq!(directory.record_count(), 0);
    }
}
