//! Storage backends: the flat key/value contract and its implementations.
//!
//! The [`Store`] trait is the underlying-store collaborator the tag layer
//! wraps: flat key lookup, write with optional TTL, delete, full flush.
//! No tag awareness lives here; backends that natively group keys by tag
//! don't need this crate at all.
//!
//! Values are raw bytes. Typed encoding (serde + bincode) happens one layer
//! up in the facade, so backends stay oblivious to payload shape.

mod memory;
mod redb;

pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;

use std::time::Duration;

use anyhow::Result;

/// Flat key/value store contract.
///
/// Methods take `&self`: implementations provide their own interior
/// mutability or locking. All operations are synchronous; failures propagate
/// unchanged to the caller.
pub trait Store {
    /// Look up a value. Absent (or expired) keys read as `None`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value, expiring after `ttl` if given.
    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Write a value with no expiration.
    fn forever(&self, key: &str, value: &[u8]) -> Result<()> {
        self.put(key, value, None)
    }

    /// Delete a key. Returns whether something was actually removed,
    /// making repeated deletion of the same key a harmless no-op.
    fn forget(&self, key: &str) -> Result<bool>;

    /// Remove every key unconditionally.
    fn flush(&self) -> Result<()>;
}
