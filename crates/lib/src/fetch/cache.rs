//! Short-lived TTL cache for fetched resources.

use std::collections::HashMap;
use std::time::Duration;

/// A cached value and the time it was written.
///
/// Entries are replaced, never mutated.
struct CacheEntry<T> {
    value: T,
    inserted_at: u64,
}

/// Keyed TTL cache. Expired entries are dropped lazily on lookup.
pub(super) struct ResourceCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    ttl_millis: u64,
}

impl<T: Clone> ResourceCache<T> {
    pub(super) fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_millis: ttl.as_millis() as u64,
        }
    }

    /// Look up a fresh entry. An entry whose age has reached the TTL is
    /// removed and treated as a miss.
    pub(super) fn get(&mut self, key: &str, now_millis: u64) -> Option<T> {
        match self.entries.get(key) {
            Some(entry) if now_millis.saturating_sub(entry.inserted_at) < self.ttl_millis => {
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub(super) fn insert(&mut self, key: String, value: T, now_millis: u64) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now_millis,
            },
        );
    }

    pub(super) fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }
}
