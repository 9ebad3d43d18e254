//! In-memory alias cache in front of the directory.
//!
//! The cache memoizes alias lookups so the resolution pipeline doesn't hit
//! the durable store on every received message. It never originates truth:
//! every entry is derived from a directory record and can be rebuilt from
//! one.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use mixchat_proto::{Identity, KeyError};
use mixchat_store::{AliasDirectory, DirectoryError};

/// Encode an identity handle as a cache key string.
///
/// Layout: `{len}:{peer_b64}{provider_b64}` where `len` is the character
/// length of the peer half. The explicit length prefix makes the key
/// decodable even if the two key types ever diverge in size; splitting the
/// string in half would break silently in that case.
pub fn encode_cache_key(identity: &Identity) -> String {
    let peer = identity.public_key.to_base64();
    let provider = identity.provider_key.to_base64();
    format!("{}:{peer}{provider}", peer.len())
}

/// Decode a cache key string back to the identity handle it names.
///
/// # Errors
///
/// Returns [`KeyError::Malformed`] if the length prefix is missing or out
/// of range, or a base64/length error if either component fails to decode
/// into a valid key.
pub fn decode_cache_key(key: &str) -> Result<Identity, KeyError> {
    let (prefix, rest) = key
        .split_once(':')
        .ok_or_else(|| KeyError::Malformed("missing length prefix".to_string()))?;
    let split: usize =
        prefix.parse().map_err(|_| KeyError::Malformed("unparsable length prefix".to_string()))?;

    if split > rest.len() || !rest.is_char_boundary(split) {
        return Err(KeyError::Malformed("length prefix out of range".to_string()));
    }

    let (peer, provider) = rest.split_at(split);
    Identity::from_base64(peer, provider)
}

/// Write-through/read-through alias cache shared by the resolution
/// pipeline and the command handler.
///
/// The mapping is mutex-guarded; both concurrent actors go through the
/// same lock. Clone is cheap and clones share the same entries and the
/// same directory handle.
///
/// Invariant: the cache never stores an empty alias. An empty directory
/// record is a miss, so the directory is re-checked on every lookup until
/// an alias is actually assigned.
#[derive(Clone)]
pub struct AliasCache<S: AliasDirectory> {
    entries: Arc<Mutex<HashMap<String, String>>>,
    directory: S,
}

impl<S: AliasDirectory> AliasCache<S> {
    /// Create an empty cache in front of the given directory.
    pub fn new(directory: S) -> Self {
        Self { entries: Arc::new(Mutex::new(HashMap::new())), directory }
    }

    /// Lock the entry map, recovering from poisoning.
    ///
    /// A poisoned lock only means another thread panicked mid-update; the
    /// map itself is a plain string map and stays usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the alias for an identity.
    ///
    /// Checks the in-memory mapping first; on miss, reads through to the
    /// directory. A non-empty stored name populates the cache and is
    /// returned. `Ok(None)` means no alias exists anywhere and the caller
    /// falls back to a synthesized display name.
    ///
    /// # Errors
    ///
    /// Propagates [`DirectoryError`] from the read-through; the caller
    /// decides whether that is fatal.
    pub fn lookup(&self, identity: &Identity) -> Result<Option<String>, DirectoryError> {
        let key = encode_cache_key(identity);
        if let Some(name) = self.entries().get(&key) {
            return Ok(Some(name.clone()));
        }

        let record = self.directory.get(identity)?;
        if record.name.is_empty() {
            // Not cached: empty means "no alias set", and caching it would
            // stop us from noticing when one is assigned.
            return Ok(None);
        }

        self.entries().insert(key, record.name.clone());
        Ok(Some(record.name))
    }

    /// Drop the cached entry for a single identity.
    ///
    /// Called immediately after a mutation affecting that handle so the
    /// next lookup re-reads the directory.
    pub fn invalidate(&self, identity: &Identity) {
        let key = encode_cache_key(identity);
        self.entries().remove(&key);
    }

    /// Evict every cached entry that disagrees with the directory.
    ///
    /// Re-reads the directory for each entry and evicts on any mismatch,
    /// including the record no longer existing. Entries whose key no
    /// longer decodes are evicted as corrupt. Invoked once per completed
    /// user command; between commands the cache may briefly serve stale
    /// names, which is the accepted consistency bound.
    ///
    /// # Errors
    ///
    /// Propagates the first [`DirectoryError`] hit while re-reading.
    pub fn reconcile(&self) -> Result<(), DirectoryError> {
        // Snapshot so the lock is not held across directory reads.
        let snapshot: Vec<(String, String)> =
            self.entries().iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        let mut evict = Vec::new();
        for (key, cached_name) in snapshot {
            match decode_cache_key(&key) {
                Ok(identity) => {
                    let record = self.directory.get(&identity)?;
                    if record.name != cached_name {
                        evict.push(key);
                    }
                },
                Err(e) => {
                    tracing::warn!("evicting undecodable cache key: {e}");
                    evict.push(key);
                },
            }
        }

        let mut entries = self.entries();
        for key in evict {
            entries.remove(&key);
        }

        Ok(())
    }

    /// Number of cached entries.
    ///
    /// Useful for debugging and testing.
    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }
}
