//! Tag-scoped cache facade.
//!
//! [`TaggedCache`] presents the same read/write surface as the underlying
//! store, bound to one fixed tag set. Every mutating call keeps the tag
//! index in sync:
//!
//! - writes register the key *before* storing the value, so a crash between
//!   the two leaves at worst a dangling index entry (harmless; eviction
//!   treats missing keys as no-ops) rather than a live key nothing can evict
//! - deletes unregister the key before removing the value
//!
//! The bound state is fixed at construction; a fresh facade is obtained by
//! binding a new tag set via [`Taggable::tags`]. Values are serde types,
//! bincode-encoded into the byte-oriented store.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::index::TagIndex;
use crate::store::Store;
use crate::tags::{split_namespace, TagSet};

/// Key/value cache API scoped to a bound tag set.
pub struct TaggedCache<'s, S: Store> {
    store: &'s S,
    tags: TagSet,
    /// Canonical namespace, computed once at bind time
    namespace: String,
}

impl<'s, S: Store> TaggedCache<'s, S> {
    /// Bind a facade to the given store and tag set.
    pub fn new(store: &'s S, tags: TagSet) -> Self {
        let namespace = tags.namespace();
        Self {
            store,
            tags,
            namespace,
        }
    }

    /// The tag set this facade is bound to.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// The canonical namespace for the bound tag set.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn index(&self) -> TagIndex<'s, S> {
        TagIndex::new(self.store)
    }

    /// Read a value written under `key`. Absent or expired keys read as
    /// `None`. Reads never touch the tag index.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.store.get(key)? else {
            return Ok(None);
        };

        let value = bincode::deserialize(&bytes)
            .with_context(|| format!("Failed to deserialize cached value for {key}"))?;
        Ok(Some(value))
    }

    /// Store a value under `key`, expiring after `ttl` if given.
    ///
    /// The key is registered in the tag index first, then written to the
    /// store. With an empty tag set the registration is a no-op and this is
    /// a plain store write.
    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        self.index().register_key(&self.namespace, key)?;

        let bytes = bincode::serialize(value)
            .with_context(|| format!("Failed to serialize value for {key}"))?;
        self.store.put(key, &bytes, ttl)
    }

    /// Store a value under `key` with no expiration.
    pub fn forever<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.put(key, value, None)
    }

    /// Remove `key` from the cache and its registration from the tag index.
    ///
    /// Returns whether the store actually removed something.
    pub fn forget(&self, key: &str) -> Result<bool> {
        self.index().unregister_key(&self.namespace, key)?;
        self.store.forget(key)
    }

    /// Selectively evict everything written under the bound tags.
    ///
    /// Clears every key registered under any namespace matching any bound
    /// tag, and nothing else. Un-tagged entries and disjoint tag groups are
    /// untouched. This is the tag-scoped counterpart of [`flush`](Self::flush).
    pub fn flush_tags(&self) -> Result<()> {
        let tags = split_namespace(&self.namespace);
        if tags.is_empty() {
            return Ok(());
        }
        self.index().evict_by_tags(&tags)
    }

    /// Remove all items from the cache.
    ///
    /// Evicts the bound tags first (keeping the index consistent), then
    /// performs a full flush of the underlying store. Note this wipes the
    /// *whole* cache, tagged or not, matching the wrapped store's native
    /// full-flush semantics; use [`flush_tags`](Self::flush_tags) to clear
    /// only the bound tags.
    pub fn flush(&self) -> Result<()> {
        let tags = split_namespace(&self.namespace);
        if !tags.is_empty() {
            self.index().evict_by_tags(&tags)?;
        }
        self.index().clear()?;

        self.store.flush()
    }
}

/// Entry point: bind a tag set to any store.
///
/// ```
/// use tagcache::{MemoryStore, Taggable};
///
/// let store = MemoryStore::new();
/// let cache = store.tags(&["posts", "user:1"]);
/// cache.forever("post:1", &"hello").unwrap();
///
/// store.tags(&["posts"]).flush_tags().unwrap();
/// assert_eq!(cache.get::<String>("post:1").unwrap(), None);
/// ```
pub trait Taggable: Store + Sized {
    /// Obtain a cache facade bound to the given tags, in order.
    ///
    /// Tag names must not contain `'|'` (the namespace separator).
    fn tags<T: AsRef<str>>(&self, names: &[T]) -> TaggedCache<'_, Self> {
        TaggedCache::new(self, TagSet::new(names.iter().map(|n| n.as_ref())))
    }
}

impl<S: Store + Sized> Taggable for S {}
