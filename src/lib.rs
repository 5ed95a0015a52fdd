//! tagcache - tag-based invalidation for flat key/value stores
//!
//! Some cache backends group entries by tag natively; flat stores only know
//! key lookup and full flush. This crate layers tag grouping on top of any
//! flat store by maintaining an auxiliary index inside the store itself,
//! letting callers evict everything written under one or more tags without
//! scanning the key space.
//!
//! # Architecture
//!
//! ```text
//! Taggable::tags() → TaggedCache → TagIndex → Store
//!        ↓               ↓             ↓         ↓
//!     bind tag       put/forget    namespace   flat
//!      set once      keep index    → key list  key/value
//!                     in sync      (one blob)  backend
//! ```
//!
//! Every tagged write registers its key in the index before storing the
//! value; tag-scoped eviction reads the index, deletes the registered keys,
//! and rewrites the index with the evicted namespaces removed. The index is
//! one serialized blob under the reserved key `_tags_data`, so each update
//! is a load/mutate/persist round trip with no atomicity beyond the store's
//! own (concurrent tagged writers can lose interleaved updates; see
//! [`index`] for the full caveat).
//!
//! # Example
//!
//! ```
//! use tagcache::{MemoryStore, Taggable};
//!
//! let store = MemoryStore::new();
//!
//! store.tags(&["posts", "user:1"]).forever("post:1", &"body")?;
//! store.tags(&["users"]).forever("user:1", &"profile")?;
//!
//! // Evict everything tagged "posts"; "users" entries survive
//! store.tags(&["posts"]).flush_tags()?;
//!
//! assert_eq!(store.tags(&["users"]).get::<String>("post:1")?, None);
//! assert!(store.tags(&["users"]).get::<String>("user:1")?.is_some());
//! # anyhow::Ok(())
//! ```

pub mod index;
pub mod store;
pub mod tagged;
pub mod tags;

// Re-export the public surface
pub use index::{TagIndex, DATA_KEY};
pub use store::{MemoryStore, RedbStore, Store};
pub use tagged::{Taggable, TaggedCache};
pub use tags::{split_namespace, TagSet, SEPARATOR};
