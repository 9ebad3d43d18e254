//! Durable alias directory for the mixchat client.
//!
//! The directory is the single owner of persisted identity → alias
//! mappings. It is a byte-keyed store with a fixed namespace prefix: each
//! record is keyed by the encoded identity handle and holds the raw bytes
//! of the assigned alias.
//!
//! The trait is synchronous (no async) in the same mold as the rest of the
//! storage layer; implementations serialize conflicting writes internally
//! and provide per-key atomicity. No operation spans multiple keys
//! atomically.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod error;
mod memory;
mod redb;

pub use codec::{ALIAS_KEY_LEN, ALIAS_PREFIX, decode_alias_key, encode_alias_key};
pub use error::DirectoryError;
pub use memory::MemoryDirectory;
use mixchat_proto::Identity;

pub use self::redb::RedbDirectory;

/// A single directory record: an identity handle and its assigned alias.
///
/// `name` may be empty, which means "no alias set". The directory hands
/// back an empty-named record rather than a not-found error so the caller
/// keeps the identity handle either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRecord {
    /// The user-assigned alias; empty when none is set.
    pub name: String,
    /// The identity handle the alias is (or would be) attached to.
    pub identity: Identity,
}

impl AliasRecord {
    /// A record representing "no alias set" for the given identity.
    pub fn unset(identity: Identity) -> Self {
        Self { name: String::new(), identity }
    }
}

/// The durable identity → alias mapping.
///
/// Must be `Clone` (handles are passed to the cache, the command handler,
/// and the resolution pipeline), `Send + Sync`, and synchronous.
/// Implementations share state via `Arc`, so clones see the same records.
///
/// All operations return [`DirectoryError`] on storage failure; nothing in
/// this layer panics on I/O problems. "Not found" is not an error: see
/// [`AliasDirectory::get`].
pub trait AliasDirectory: Clone + Send + Sync + 'static {
    /// Assign an alias to an identity, silently overwriting any previous
    /// assignment.
    fn put(&self, identity: &Identity, name: &str) -> Result<(), DirectoryError>;

    /// Fetch the record for an identity.
    ///
    /// Returns a record with an empty `name` when no alias is stored;
    /// absence is represented by the empty name, never by an error.
    fn get(&self, identity: &Identity) -> Result<AliasRecord, DirectoryError>;

    /// Remove the alias for an identity. No-op when absent.
    fn remove(&self, identity: &Identity) -> Result<(), DirectoryError>;

    /// Enumerate every record under the alias namespace.
    ///
    /// Order is key byte order: peer key first, then provider key — not
    /// insertion order.
    fn list_all(&self) -> Result<Vec<AliasRecord>, DirectoryError>;

    /// Enumerate records whose alias exactly matches `name`.
    ///
    /// A linear filter over [`AliasDirectory::list_all`]; there is no
    /// secondary index by name.
    fn list_by_name(&self, name: &str) -> Result<Vec<AliasRecord>, DirectoryError> {
        Ok(self.list_all()?.into_iter().filter(|record| record.name == name).collect())
    }

    /// Remove every record under the alias namespace.
    fn remove_all(&self) -> Result<(), DirectoryError>;
}
