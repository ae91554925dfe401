//! Eviction Ledger Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;

use super::CacheKey;

// == Eviction Ledger ==
/// Tracks access order for LRU eviction strategy.
///
/// Every key carries a monotonically increasing access stamp:
/// - Lowest stamp = Least recently used
/// - Highest stamp = Most recently used
///
/// Moving a key to the most-recently-used end and popping the oldest key are
/// both O(log n). The relative order of untouched keys never changes.
#[derive(Debug, Default)]
pub struct EvictionLedger {
    /// Keys ordered by access stamp
    order: BTreeMap<u64, CacheKey>,
    /// Current stamp of every tracked key
    stamps: HashMap<CacheKey, u64>,
    /// Next stamp to hand out
    clock: u64,
    /// Population bound, None = unbounded
    capacity: Option<NonZeroUsize>,
}

impl EvictionLedger {
    // == Constructor ==
    /// Creates a new empty ledger bounded at `capacity` keys.
    pub fn new(capacity: Option<NonZeroUsize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// If the key is tracked it is moved, otherwise it is added.
    pub fn touch(&mut self, key: CacheKey) {
        let stamp = self.next_stamp();
        if let Some(previous) = self.stamps.insert(key, stamp) {
            self.order.remove(&previous);
        }
        self.order.insert(stamp, key);
    }

    // == Promote ==
    /// Moves an already tracked key to the most recently used end.
    ///
    /// Returns false, leaving the ledger untouched, if the key is not tracked.
    pub fn promote(&mut self, key: &CacheKey) -> bool {
        if !self.stamps.contains_key(key) {
            return false;
        }
        self.touch(*key);
        true
    }

    // == Remove ==
    /// Removes a key from the ledger.
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        match self.stamps.remove(key) {
            Some(stamp) => {
                self.order.remove(&stamp);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if the ledger is empty.
    pub fn evict_oldest(&mut self) -> Option<CacheKey> {
        let (_, key) = self.order.pop_first()?;
        self.stamps.remove(&key);
        Some(key)
    }

    // == Is Full ==
    /// True when one more key would exceed the capacity.
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.len() >= capacity.get())
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.stamps.contains_key(key)
    }

    /// Keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &CacheKey> + '_ {
        self.order.values()
    }

    /// Forgets every key. The capacity is kept.
    pub fn clear(&mut self) {
        self.order.clear();
        self.stamps.clear();
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
