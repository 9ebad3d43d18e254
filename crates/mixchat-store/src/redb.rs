//! Redb-backed durable directory implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! All alias assignments survive client restarts.

use std::{path::Path, sync::Arc};

use ::redb::{Database, ReadableTable, TableDefinition};
use mixchat_proto::Identity;

use crate::{
    ALIAS_PREFIX, AliasDirectory, AliasRecord, DirectoryError, decode_alias_key, encode_alias_key,
};

/// Table: aliases
/// Key: `ALIAS_PREFIX || peer_key || provider_key` [69 bytes]
/// Value: raw bytes of the assigned alias (may be empty)
const ALIASES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("aliases");

/// Durable alias directory backed by Redb.
///
/// Thread-safe through Redb's internal locking: concurrent `put`/`remove`/
/// `get` are serialized per transaction. Clone is cheap (Arc); the database
/// file is closed exactly once, when the last handle drops.
#[derive(Clone)]
pub struct RedbDirectory {
    db: Arc<Database>,
}

impl RedbDirectory {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the alias table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Io` if the database cannot be opened or
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let db = Database::create(path.as_ref()).map_err(|e| DirectoryError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| DirectoryError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(ALIASES).map_err(|e| DirectoryError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| DirectoryError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Exclusive upper bound for a range scan over the alias namespace.
    ///
    /// The prefix with its last byte incremented; every key carrying the
    /// prefix sorts strictly below it.
    fn namespace_end() -> Vec<u8> {
        let mut end = ALIAS_PREFIX.to_vec();
        if let Some(last) = end.last_mut() {
            *last += 1;
        }
        end
    }

    /// Collect all records in the namespace from an open table.
    ///
    /// Keys that fail to decode are skipped with a warning rather than
    /// failing the whole enumeration; a single corrupt key must not make
    /// every listing unusable.
    fn collect_records<T: ReadableTable<&'static [u8], &'static [u8]>>(
        table: &T,
    ) -> Result<Vec<AliasRecord>, DirectoryError> {
        let end = Self::namespace_end();
        let results = table
            .range(ALIAS_PREFIX..end.as_slice())
            .map_err(|e| DirectoryError::Io(e.to_string()))?;

        let mut records = Vec::new();
        for result in results {
            let (key, value) = result.map_err(|e| DirectoryError::Io(e.to_string()))?;
            match decode_alias_key(key.value()) {
                Ok(identity) => {
                    let name = String::from_utf8_lossy(value.value()).into_owned();
                    records.push(AliasRecord { name, identity });
                },
                Err(e) => {
                    tracing::warn!("skipping undecodable alias key: {e}");
                },
            }
        }

        Ok(records)
    }
}

impl AliasDirectory for RedbDirectory {
    fn put(&self, identity: &Identity, name: &str) -> Result<(), DirectoryError> {
        let txn = self.db.begin_write().map_err(|e| DirectoryError::Io(e.to_string()))?;

        {
            let mut table =
                txn.open_table(ALIASES).map_err(|e| DirectoryError::Io(e.to_string()))?;

            let key = encode_alias_key(identity);
            // Overwrites silently when the entry already exists.
            table
                .insert(key.as_slice(), name.as_bytes())
                .map_err(|e| DirectoryError::Io(e.to_string()))?;
        }

        txn.commit().map_err(|e| DirectoryError::Io(e.to_string()))?;

        Ok(())
    }

    fn get(&self, identity: &Identity) -> Result<AliasRecord, DirectoryError> {
        let txn = self.db.begin_read().map_err(|e| DirectoryError::Io(e.to_string()))?;
        let table = txn.open_table(ALIASES).map_err(|e| DirectoryError::Io(e.to_string()))?;

        let key = encode_alias_key(identity);

        match table.get(key.as_slice()).map_err(|e| DirectoryError::Io(e.to_string()))? {
            Some(value) => {
                let name = String::from_utf8_lossy(value.value()).into_owned();
                Ok(AliasRecord { name, identity: *identity })
            },
            None => Ok(AliasRecord::unset(*identity)),
        }
    }

    fn remove(&self, identity: &Identity) -> Result<(), DirectoryError> {
        let txn = self.db.begin_write().map_err(|e| DirectoryError::Io(e.to_string()))?;

        {
            let mut table =
                txn.open_table(ALIASES).map_err(|e| DirectoryError::Io(e.to_string()))?;

            let key = encode_alias_key(identity);
            table.remove(key.as_slice()).map_err(|e| DirectoryError::Io(e.to_string()))?;
        }

        txn.commit().map_err(|e| DirectoryError::Io(e.to_string()))?;

        Ok(())
    }

    fn list_all(&self) -> Result<Vec<AliasRecord>, DirectoryError> {
        let txn = self.db.begin_read().map_err(|e| DirectoryError::Io(e.to_string()))?;
        let table = txn.open_table(ALIASES).map_err(|e| DirectoryError::Io(e.to_string()))?;

        Self::collect_records(&table)
    }

    fn remove_all(&self) -> Result<(), DirectoryError> {
        let txn = self.db.begin_write().map_err(|e| DirectoryError::Io(e.to_string()))?;

        {
            let mut table =
                txn.open_table(ALIASES).map_err(|e| DirectoryError::Io(e.to_string()))?;

            let end = Self::namespace_end();
            let mut keys = Vec::new();
            {
                let results = table
                    .range(ALIAS_PREFIX..end.as_slice())
                    .map_err(|e| DirectoryError::Io(e.to_string()))?;
                for result in results {
                    let (key, _) = result.map_err(|e| DirectoryError::Io(e.to_string()))?;
                    keys.push(key.value().to_vec());
                }
            }

            for key in keys {
                table.remove(key.as_slice()).map_err(|e| DirectoryError::Io(e.to_string()))?;
            }
        }

        txn.commit().map_err(|e| DirectoryError::Io(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn identity(peer: u8, provider: u8) -> Identity {
        Identity::from_bytes(&[peer; 32], &[provider; 32]).unwrap()
    }

    #[test]
    fn test_get_unset_returns_empty_name() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        let id = identity(1, 2);
        let record = directory.get(&id).unwrap();
        assert_eq!(record.name, "");
        assert_eq!(record.identity, id);
    }

    #[test]
    fn test_put_get_round_trip() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        let id = identity(1, 2);
        directory.put(&id, "bob").unwrap();

        let record = directory.get(&id).unwrap();
        assert_eq!(record.name, "bob");
        assert_eq!(record.identity, id);
    }

    #[test]
    fn test_put_overwrites_silently() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        let id = identity(1, 2);
        directory.put(&id, "bob").unwrap();
        directory.put(&id, "bob2").unwrap();

        assert_eq!(directory.get(&id).unwrap().name, "bob2");
        assert_eq!(directory.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_put_is_idempotent() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        let id = identity(1, 2);
        directory.put(&id, "bob").unwrap();
        directory.put(&id, "bob").unwrap();

        let records = directory.list_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "bob");
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        directory.remove(&identity(1, 2)).unwrap();
        assert!(directory.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_list_all_key_byte_order() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        // Inserted out of order on purpose
        directory.put(&identity(3, 0), "carol").unwrap();
        directory.put(&identity(1, 9), "alice").unwrap();
        directory.put(&identity(1, 2), "bob").unwrap();

        let names: Vec<_> =
            directory.list_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["bob", "alice", "carol"]);
    }

    #[test]
    fn test_list_by_name_exact_match() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        directory.put(&identity(1, 1), "bob").unwrap();
        directory.put(&identity(2, 2), "bob").unwrap();
        directory.put(&identity(3, 3), "bobby").unwrap();

        let matches = directory.list_by_name("bob").unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|r| r.name == "bob"));
    }

    #[test]
    fn test_remove_all_clears_namespace() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        for i in 1..=5 {
            directory.put(&identity(i, i), "peer").unwrap();
        }
        assert_eq!(directory.list_all().unwrap().len(), 5);

        directory.remove_all().unwrap();
        assert!(directory.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_aliases_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        let id = identity(7, 8);

        {
            let directory = RedbDirectory::open(&path).unwrap();
            directory.put(&id, "durable").unwrap();
        }

        let directory = RedbDirectory::open(&path).unwrap();
        assert_eq!(directory.get(&id).unwrap().name, "durable");
    }

    #[test]
    fn test_empty_value_round_trips() {
        let dir = tempdir().unwrap();
        let directory = RedbDirectory::open(dir.path().join("test.redb")).unwrap();

        let id = identity(1, 2);
        directory.put(&id, "").unwrap();

        // An empty stored value still comes back as a record for the handle.
        let record = directory.get(&id).unwrap();
        assert_eq!(record.name, "");
        assert_eq!(directory.list_all().unwrap().len(), 1);
    }
}
