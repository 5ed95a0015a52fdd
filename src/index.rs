//! The tag index: which cache keys were written under which namespace.
//!
//! The index is not a native structure of the underlying store. It lives as
//! one bincode blob under a single reserved key ([`DATA_KEY`]), so every
//! update is a full load/mutate/persist round trip against that key. The
//! store provides no atomicity for that cycle: concurrent tagged writers
//! race on it and the last writer wins, silently dropping interleaved
//! updates. Known limitation; callers needing stronger guarantees must
//! serialize access externally.
//!
//! Lifecycle:
//! - Created lazily on first tagged write (absent blob loads as empty)
//! - A namespace entry is created on first write, appended on each later
//!   write, and dropped wholesale when a matching tag is evicted
//! - Keys the store expires on its own are never garbage-collected here;
//!   eviction treats deleting an already-absent key as a no-op

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::store::Store;
use crate::tags::split_namespace;

/// Reserved store key holding the serialized index.
pub const DATA_KEY: &str = "_tags_data";

/// Namespace → ordered list of registered cache keys.
///
/// BTreeMap keeps the serialized blob deterministic. Lists preserve insertion
/// order and may contain duplicates (registration is not idempotent).
type IndexMap = BTreeMap<String, Vec<String>>;

/// Read-modify-write access to the persisted tag index.
///
/// Borrows the underlying store; all state lives in the store itself under
/// [`DATA_KEY`].
pub struct TagIndex<'s, S: Store> {
    store: &'s S,
}

impl<'s, S: Store> TagIndex<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Load the full index from the reserved key.
    ///
    /// Absent key = empty index (lazy creation). A blob that does not
    /// deserialize to the expected mapping shape is treated as empty rather
    /// than an error; prior associations are lost, writes proceed safely.
    fn load(&self) -> Result<IndexMap> {
        let Some(bytes) = self.store.get(DATA_KEY)? else {
            return Ok(IndexMap::new());
        };

        match bincode::deserialize(&bytes) {
            Ok(map) => Ok(map),
            Err(err) => {
                warn!("Malformed tag index under {DATA_KEY}, treating as empty: {err}");
                Ok(IndexMap::new())
            }
        }
    }

    /// Persist the full index back under the reserved key, never expiring.
    fn persist(&self, index: &IndexMap) -> Result<()> {
        let bytes = bincode::serialize(index).context("Failed to serialize tag index")?;
        self.store.forever(DATA_KEY, &bytes)
    }

    /// Record that `key` was written under `namespace`.
    ///
    /// Appends to the namespace's key list, creating it on first write.
    /// Not idempotent: registering the same key twice appends it twice;
    /// eviction and unregistration both tolerate duplicates. No-op for the
    /// empty namespace (un-tagged writes are never indexed).
    pub fn register_key(&self, namespace: &str, key: &str) -> Result<()> {
        if namespace.is_empty() {
            return Ok(());
        }

        let mut index = self.load()?;
        index
            .entry(namespace.to_string())
            .or_default()
            .push(key.to_string());

        debug!("Registered {key} under namespace {namespace}");
        self.persist(&index)
    }

    /// Drop `key`'s registration from `namespace`.
    ///
    /// Removes every list entry equal to `key` (the list may hold
    /// duplicates). No-op if the namespace is empty, the index is absent or
    /// malformed, or the namespace has no entry.
    pub fn unregister_key(&self, namespace: &str, key: &str) -> Result<()> {
        if namespace.is_empty() {
            return Ok(());
        }

        let mut index = self.load()?;
        let Some(keys) = index.get_mut(namespace) else {
            return Ok(());
        };

        keys.retain(|k| k != key);

        debug!("Unregistered {key} from namespace {namespace}");
        self.persist(&index)
    }

    /// Delete every key registered under a namespace matching any of `tags`,
    /// then drop those namespaces from the index.
    ///
    /// A namespace matches a tag when the tag is one of its separator-joined
    /// tokens, so evicting `"posts"` clears namespace `"posts|user:1"` but
    /// leaves `"postscript"` alone. Keys the store already expired delete as
    /// no-ops. The reduced index is persisted once, after all tags are
    /// processed.
    pub fn evict_by_tags<T: AsRef<str>>(&self, tags: &[T]) -> Result<()> {
        let mut index = self.load()?;

        for tag in tags {
            let tag = tag.as_ref();

            let matching: Vec<String> = index
                .keys()
                .filter(|namespace| split_namespace(namespace).contains(&tag))
                .cloned()
                .collect();

            for namespace in matching {
                if let Some(keys) = index.remove(&namespace) {
                    debug!(
                        "Evicting {} key(s) from namespace {namespace} for tag {tag}",
                        keys.len()
                    );
                    for key in keys {
                        // Missing keys (expired or already deleted) are fine
                        self.store.forget(&key)?;
                    }
                }
            }
        }

        self.persist(&index)
    }

    /// Drop the index wholesale.
    ///
    /// Used on the full-flush path, where the store flush is about to remove
    /// every key anyway; clearing first keeps the index consistent even if
    /// the flush fails midway.
    pub fn clear(&self) -> Result<()> {
        self.store.forget(DATA_KEY)?;
        Ok(())
    }
}
