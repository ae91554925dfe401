//! Cache Store Module
//!
//! Key to entry mapping. Recency and capacity live in the eviction ledger;
//! the engine keeps both in step.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::{CacheEntry, CacheKey};

// == Cache Store ==
/// Entries indexed by cache key.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-entry storage
    entries: HashMap<CacheKey, Arc<CacheEntry<V>>>,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    // == Get ==
    /// Returns a handle to the entry stored under `key`.
    ///
    /// The handle stays valid even if the entry is later replaced or evicted.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry<V>>> {
        self.entries.get(key).cloned()
    }

    // == Insert ==
    /// Stores an entry, returning the one it replaced.
    pub fn insert(
        &mut self,
        key: CacheKey,
        entry: Arc<CacheEntry<V>>,
    ) -> Option<Arc<CacheEntry<V>>> {
        self.entries.insert(key, entry)
    }

    // == Remove ==
    /// Removes an entry by key.
    pub fn remove(&mut self, key: &CacheKey) -> Option<Arc<CacheEntry<V>>> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    // == Expired Keys ==
    /// Keys of every entry expired at `now`.
    pub fn expired_keys(&self, now: Instant) -> Vec<CacheKey> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> + '_ {
        self.entries.keys()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ttl;
    use std::time::Duration;

    fn key(name: &str) -> CacheKey {
        CacheKey::derive(name).unwrap()
    }

    fn entry(value: &str, now: Instant, ttl: Ttl) -> Arc<CacheEntry<String>> {
        Arc::new(CacheEntry::new(value.to_string(), now, ttl))
    }

    #[test]
    fn test_store_new() {
        let store: CacheStore<String> = CacheStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = CacheStore::new();
        let now = Instant::now();

        assert!(store.insert(key("key1"), entry("value1", now, Ttl::Infinite)).is_none());
        let found = store.get(&key("key1")).unwrap();

        assert_eq!(*found.value, "value1");
        assert_eq!(store.len(), 1);
        assert!(store.contains(&key("key1")));
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store: CacheStore<String> = CacheStore::new();
        assert!(store.get(&key("nonexistent")).is_none());
    }

    #[test]
    fn test_store_overwrite_replaces_entry() {
        let mut store = CacheStore::new();
        let now = Instant::now();

        store.insert(key("key1"), entry("value1", now, Ttl::Infinite));
        let replaced = store
            .insert(key("key1"), entry("value2", now, Ttl::Infinite))
            .unwrap();

        assert_eq!(*replaced.value, "value1");
        assert_eq!(*store.get(&key("key1")).unwrap().value, "value2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_handle_survives_removal() {
        let mut store = CacheStore::new();
        let now = Instant::now();

        store.insert(key("key1"), entry("value1", now, Ttl::Infinite));
        let handle = store.get(&key("key1")).unwrap();
        store.remove(&key("key1"));

        assert!(store.is_empty());
        assert_eq!(*handle.value, "value1");
    }

    #[test]
    fn test_store_expired_keys() {
        let mut store = CacheStore::new();
        let now = Instant::now();

        store.insert(key("short"), entry("a", now, Ttl::Finite(Duration::from_secs(1))));
        store.insert(key("long"), entry("b", now, Ttl::Finite(Duration::from_secs(10))));
        store.insert(key("forever"), entry("c", now, Ttl::Infinite));

        assert!(store.expired_keys(now).is_empty());
        assert_eq!(
            store.expired_keys(now + Duration::from_secs(1)),
            vec![key("short")]
        );
        assert_eq!(store.expired_keys(now + Duration::from_secs(60)).len(), 2);
    }

    #[test]
    fn test_store_clear() {
        let mut store = CacheStore::new();
        let now = Instant::now();
        store.insert(key("a"), entry("a", now, Ttl::Infinite));
        store.insert(key("b"), entry("b", now, Ttl::Infinite));

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.keys().count(), 0);
    }
}
