//! In-process store backed by a mutex-guarded hash map.
//!
//! Zero-setup backend for tests and short-lived embedding. TTL is honored
//! lazily: expired entries are dropped when read, not swept in the
//! background.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::Mutex;

use super::Store;

/// One stored value plus its optional expiry deadline.
#[derive(Debug, Clone)]
struct Entry {
    payload: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// In-memory key/value store.
///
/// Thread-safe via an internal mutex; suitable for sharing across threads
/// within one process. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries. Test and diagnostics helper.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(Instant::now()),
            None => return Ok(None),
        };

        if expired {
            // Lazy expiry: drop on read
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|e| e.payload.clone()))
    }

    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            payload: value.to_vec(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().remove(key).is_some())
    }

    fn flush(&self) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() -> Result<()> {
        let store = MemoryStore::new();
        store.put("k", b"value", None)?;
        assert_eq!(store.get("k")?, Some(b"value".to_vec()));
        assert_eq!(store.get("missing")?, None);
        Ok(())
    }

    #[test]
    fn test_ttl_expiry_hides_entry() -> Result<()> {
        let store = MemoryStore::new();
        store.put("k", b"v", Some(Duration::ZERO))?;
        assert_eq!(store.get("k")?, None);
        Ok(())
    }

    #[test]
    fn test_forever_does_not_expire() -> Result<()> {
        let store = MemoryStore::new();
        store.forever("k", b"v")?;
        assert_eq!(store.get("k")?, Some(b"v".to_vec()));
        Ok(())
    }

    #[test]
    fn test_forget_reports_removal() -> Result<()> {
        let store = MemoryStore::new();
        store.put("k", b"v", None)?;
        assert!(store.forget("k")?);
        assert!(!store.forget("k")?);
        Ok(())
    }

    #[test]
    fn test_flush_clears_everything() -> Result<()> {
        let store = MemoryStore::new();
        store.put("a", b"1", None)?;
        store.put("b", b"2", None)?;
        store.flush()?;
        assert!(store.is_empty());
        Ok(())
    }
}
