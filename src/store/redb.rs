//! Persistent store backed by redb.
//!
//! Layout:
//! - Database: `<root>/.tagcache/cache.redb` (redb provides ACID guarantees)
//! - Key: cache key string
//! - Value: bincode-serialized envelope (optional expiry deadline + payload)
//!
//! Design decisions:
//! - Bincode for compact binary serialization of the envelope
//! - Expiry stored inside the value for atomic validation on read (no
//!   separate metadata table); expired entries read as absent and are only
//!   physically removed by `forget`/`flush`
//! - redb for zero-copy reads and write durability without WAL overhead
//! - The table is created eagerly at open so reads never race table creation

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::Store;

/// Table holding all cache entries.
/// Key = cache key, Value = serialized Entry
const ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// Envelope around a stored payload: expiry deadline + raw bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    /// Expiry deadline as (seconds, subsecond nanos) since UNIX_EPOCH.
    /// `None` = never expires.
    expires_at: Option<(u64, u32)>,
    /// Caller-supplied value bytes
    payload: Vec<u8>,
}

impl Entry {
    /// Build an envelope whose deadline is `now + ttl` (or none).
    fn new(payload: Vec<u8>, ttl: Option<Duration>) -> Result<Self> {
        let expires_at = match ttl {
            Some(ttl) => {
                let deadline = SystemTime::now() + ttl;
                let since_epoch = deadline
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .context("Expiry deadline is before UNIX_EPOCH")?;
                Some((since_epoch.as_secs(), since_epoch.subsec_nanos()))
            }
            None => None,
        };

        Ok(Self {
            expires_at,
            payload,
        })
    }

    /// Check whether this entry's deadline has passed.
    fn is_expired(&self, now: SystemTime) -> bool {
        let Some(deadline) = self.expires_at else {
            return false;
        };
        let Ok(since_epoch) = now.duration_since(SystemTime::UNIX_EPOCH) else {
            return false;
        };

        deadline <= (since_epoch.as_secs(), since_epoch.subsec_nanos())
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("Failed to serialize cache entry")
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Failed to deserialize cache entry")
    }
}

/// Persistent key/value store backed by redb.
///
/// Thread-safe (redb handles its own locking internally). Contents survive
/// process restarts; reopen with the same root to pick them back up.
pub struct RedbStore {
    db: Database,
    /// Path to the store directory (`.tagcache/`)
    /// Reserved for future features (e.g., size accounting, compaction)
    #[allow(dead_code)]
    store_dir: PathBuf,
}

impl RedbStore {
    /// Open or create the store database.
    ///
    /// Location: `<root>/.tagcache/cache.redb`
    ///
    /// Creates the directory and table if they don't exist. Returns an error
    /// if directory creation or database opening fails.
    pub fn open(root: &Path) -> Result<Self> {
        let store_dir = root.join(".tagcache");

        fs::create_dir_all(&store_dir)
            .with_context(|| format!("Failed to create store directory: {}", store_dir.display()))?;

        let db_path = store_dir.join("cache.redb");

        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open store database: {}", db_path.display()))?;

        // Eager table creation: a read transaction against a never-written
        // database would otherwise fail with TableDoesNotExist
        let write_txn = db
            .begin_write()
            .context("Failed to begin write transaction")?;
        write_txn
            .open_table(ENTRIES_TABLE)
            .context("Failed to open entries table")?;
        write_txn
            .commit()
            .context("Failed to commit table creation")?;

        Ok(Self { db, store_dir })
    }
}

impl Store for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(ENTRIES_TABLE)
            .context("Failed to open entries table")?;

        let Some(value_guard) = table
            .get(key)
            .with_context(|| format!("Failed to read entry for {key}"))?
        else {
            return Ok(None);
        };

        let entry = Entry::from_bytes(value_guard.value())?;

        if entry.is_expired(SystemTime::now()) {
            // Expired entries read as absent; physical removal is left to
            // forget/flush since a read transaction cannot delete
            return Ok(None);
        }

        Ok(Some(entry.payload))
    }

    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let entry = Entry::new(value.to_vec(), ttl)?;
        let bytes = entry.to_bytes()?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .context("Failed to open entries table")?;

            table
                .insert(key, bytes.as_slice())
                .with_context(|| format!("Failed to insert entry for {key}"))?;
        }

        write_txn.commit().context("Failed to commit store write")?;

        Ok(())
    }

    fn forget(&self, key: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let removed = {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .context("Failed to open entries table")?;

            // Bind before the block ends: the removed-value guard borrows
            // the table and must drop first
            let removed = table
                .remove(key)
                .with_context(|| format!("Failed to remove entry for {key}"))?
                .is_some();
            removed
        };

        write_txn.commit().context("Failed to commit store delete")?;

        Ok(removed)
    }

    fn flush(&self) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction for flush")?;

        {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .context("Failed to open entries table")?;

            let keys: Vec<String> = table
                .iter()
                .context("Failed to iterate entries")?
                .filter_map(|r| r.ok())
                .map(|(k, _)| k.value().to_string())
                .collect();

            for key in keys {
                table
                    .remove(key.as_str())
                    .context("Failed to remove entry during flush")?;
            }
        }

        write_txn.commit().context("Failed to commit store flush")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_deadline_validation() -> Result<()> {
        let eternal = Entry::new(b"v".to_vec(), None)?;
        assert!(eternal.expires_at.is_none());
        assert!(!eternal.is_expired(SystemTime::now() + Duration::from_secs(86_400)));

        let bounded = Entry::new(b"v".to_vec(), Some(Duration::from_secs(60)))?;
        assert!(bounded.expires_at.is_some());
        assert!(!bounded.is_expired(SystemTime::now()));
        assert!(bounded.is_expired(SystemTime::now() + Duration::from_secs(120)));
        Ok(())
    }

    #[test]
    fn test_put_get_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = RedbStore::open(dir.path())?;

        store.put("k", b"value", None)?;
        assert_eq!(store.get("k")?, Some(b"value".to_vec()));
        assert_eq!(store.get("missing")?, None);
        Ok(())
    }

    #[test]
    fn test_persists_across_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;

        {
            let store = RedbStore::open(dir.path())?;
            store.forever("k", b"durable")?;
        }

        let store = RedbStore::open(dir.path())?;
        assert_eq!(store.get("k")?, Some(b"durable".to_vec()));
        Ok(())
    }

    #[test]
    fn test_expired_entry_reads_as_absent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = RedbStore::open(dir.path())?;

        store.put("k", b"v", Some(Duration::ZERO))?;
        assert_eq!(store.get("k")?, None);
        Ok(())
    }

    #[test]
    fn test_forget_reports_removal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = RedbStore::open(dir.path())?;

        store.put("k", b"v", None)?;
        assert!(store.forget("k")?);
        assert!(!store.forget("k")?);
        Ok(())
    }

    #[test]
    fn test_flush_removes_all_entries() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = RedbStore::open(dir.path())?;

        store.put("a", b"1", None)?;
        store.put("b", b"2", None)?;
        store.flush()?;

        assert_eq!(store.get("a")?, None);
        assert_eq!(store.get("b")?, None);
        Ok(())
    }

    #[test]
    fn test_empty_database_reads_cleanly() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = RedbStore::open(dir.path())?;
        assert_eq!(store.get("anything")?, None);
        Ok(())
    }
}
