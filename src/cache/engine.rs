//! Cache Engine Module
//!
//! Memoizes a computation keyed by its serialized arguments, combining the
//! store, the eviction ledger, TTL expiry and the mutation guard.
//!
//! # Locking
//! - The store's write guard serializes insert, evict and overwrite. Writers
//!   take the store first, then the ledger.
//! - The ledger mutex serializes recency reordering on hits.
//! - Choosing between hit, miss and expired takes only a momentary read of
//!   the store. Two threads missing the same key may both compute it; the
//!   later commit replaces the earlier one. Store and ledger keys always match.
//! - The wrapped computation runs with no lock held.

use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, trace};

use super::{CacheEntry, CacheInfo, CacheKey, CacheStore, EvictionLedger};
use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, CachePolicy};
use crate::error::{CacheError, Result};
use crate::guard::{guard, Guarded};

type Computation<A, V, E> = Box<dyn Fn(&A) -> std::result::Result<V, E> + Send + Sync>;
type MissCallback<V> = Box<dyn Fn(V) -> V + Send + Sync>;

/// State of a key at the moment it was looked up.
enum Lookup<V> {
    Miss,
    Fresh(Arc<CacheEntry<V>>),
    Expired,
}

// == Safe Cache ==
/// A memoized computation.
///
/// Shares freely across threads behind an `Arc`. Every instance owns its own
/// store, ledger and counters.
pub struct SafeCache<A: ?Sized, V, E = Infallible> {
    function: Computation<A, V, E>,
    miss_callback: MissCallback<V>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
    store: RwLock<CacheStore<V>>,
    ledger: Mutex<EvictionLedger>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<A, V, E> SafeCache<A, V, E>
where
    A: Serialize + ?Sized,
    V: Clone + Send + Sync + 'static,
{
    // == Call ==
    /// Returns the cached result for `args`, computing it if needed.
    ///
    /// Mutable results are copied with `V::clone` on every call, hits
    /// included. `V` must clone into an independent value for that copy to
    /// protect the cache; shared handles like `Arc<Mutex<T>>` are not isolated.
    /// A failing computation leaves the cache exactly as it was.
    pub fn call(&self, args: &A) -> Result<Guarded<V>, E> {
        let key = CacheKey::derive(args)?;

        let now = self.clock.now();
        let entry = match self.lookup(&key, now) {
            Lookup::Fresh(entry) => {
                self.promote(&key, &entry, now);
                entry
            }
            Lookup::Miss => {
                debug!("cache miss for key {}", key);
                let value = self.compute(args)?;
                let entry = self.commit(key, (self.miss_callback)(value));
                self.misses.fetch_add(1, Ordering::Relaxed);
                entry
            }
            Lookup::Expired => {
                debug!("cache entry expired for key {}, refreshing", key);
                let value = self.compute(args)?;
                let entry = self.commit(key, value);
                self.hits.fetch_add(1, Ordering::Relaxed);
                entry
            }
        };

        Ok(guard(&entry.value))
    }

    fn lookup(&self, key: &CacheKey, now: Instant) -> Lookup<V> {
        match self.store.read().get(key) {
            None => Lookup::Miss,
            Some(entry) if entry.is_expired(now) => Lookup::Expired,
            Some(entry) => Lookup::Fresh(entry),
        }
    }

    fn compute(&self, args: &A) -> Result<V, E> {
        (self.function)(args).map_err(CacheError::Computation)
    }

    fn promote(&self, key: &CacheKey, entry: &CacheEntry<V>, now: Instant) {
        if !self.ledger.lock().promote(key) {
            // Evicted since the lookup; the snapshot is still served.
            trace!("cache hit for evicted key {}", key);
        } else {
            trace!(
                "cache hit for key {} (age {:?}, ttl remaining {:?})",
                key,
                entry.age(now),
                entry.ttl_remaining(now)
            );
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Stores a freshly computed value under `key`, evicting if full.
    fn commit(&self, key: CacheKey, value: V) -> Arc<CacheEntry<V>> {
        let entry = Arc::new(CacheEntry::new(value, self.clock.now(), self.policy.ttl));

        let mut store = self.store.write();
        let mut ledger = self.ledger.lock();

        if !store.contains(&key) && ledger.is_full() {
            if let Some(evicted) = ledger.evict_oldest() {
                store.remove(&evicted);
                debug!("evicted least recently used key {}", evicted);
            }
        }
        ledger.touch(key);
        store.insert(key, Arc::clone(&entry));

        entry
    }
}

impl<A: ?Sized, V, E> SafeCache<A, V, E> {
    /// Builds a cache from raw configuration around a fallible computation.
    pub fn from_config<F>(config: &CacheConfig, function: F) -> Self
    where
        F: Fn(&A) -> std::result::Result<V, E> + Send + Sync + 'static,
    {
        SafeCacheBuilder::new().config(*config).build_fallible(function)
    }

    // == Cache Info ==
    /// Returns a snapshot of the counters. Counters are not reset.
    pub fn cache_info(&self) -> CacheInfo {
        CacheInfo {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            maxsize: self.policy.maxsize(),
            currsize: self.store.read().len(),
        }
    }

    // == Cache Clear ==
    /// Drops every entry and resets the counters.
    pub fn cache_clear(&self) {
        let mut store = self.store.write();
        let mut ledger = self.ledger.lock();

        store.clear();
        ledger.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("cache cleared");
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed. Purged keys miss on their next call.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut store = self.store.write();
        let mut ledger = self.ledger.lock();

        let expired = store.expired_keys(now);
        for key in &expired {
            store.remove(key);
            ledger.remove(key);
        }

        if !expired.is_empty() {
            debug!("purged {} expired entries", expired.len());
        }
        expired.len()
    }

    /// Keys currently cached, least recently used first.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.ledger.lock().iter().copied().collect()
    }

    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.store.read().contains(key)
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Panics unless store and ledger track the same keys within capacity.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        use std::collections::HashSet;

        let store = self.store.read();
        let ledger = self.ledger.lock();
        let stored: HashSet<&CacheKey> = store.keys().collect();
        let tracked: HashSet<&CacheKey> = ledger.iter().collect();

        assert_eq!(stored, tracked, "store and ledger keys diverged");
        assert_eq!(ledger.len(), store.len());
        if let Some(maxsize) = self.policy.maxsize() {
            assert!(store.len() <= maxsize, "store exceeds maxsize");
        }
    }
}

impl<A: ?Sized, V, E> fmt::Debug for SafeCache<A, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeCache")
            .field("policy", &self.policy)
            .field("clock", &self.clock)
            .field("info", &self.cache_info())
            .finish_non_exhaustive()
    }
}

// == Safe Cache Builder ==
/// Collects cache options before wrapping a computation.
///
/// ```ignore
/// let square = SafeCacheBuilder::new()
///     .maxsize(128)
///     .ttl(30.0)
///     .build(|x: &u64| x * x);
/// assert_eq!(*square.call(&12)?, 144);
/// ```
pub struct SafeCacheBuilder<V> {
    config: CacheConfig,
    miss_callback: Option<MissCallback<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> SafeCacheBuilder<V> {
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            miss_callback: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Bounds the cache population. Values `<= 0` become 1.
    pub fn maxsize(mut self, maxsize: i64) -> Self {
        self.config.maxsize = Some(maxsize);
        self
    }

    /// Sets the freshness window in seconds. Values `<= 0` disable caching.
    pub fn ttl(mut self, seconds: f64) -> Self {
        self.config.ttl = Some(seconds);
        self
    }

    /// Replaces both limits at once.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Transforms every value computed on a miss before it is stored.
    pub fn miss_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(V) -> V + Send + Sync + 'static,
    {
        self.miss_callback = Some(Box::new(callback));
        self
    }

    /// Overrides the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // == Build ==
    /// Wraps an infallible computation.
    pub fn build<A, F>(self, function: F) -> SafeCache<A, V>
    where
        A: ?Sized,
        F: Fn(&A) -> V + Send + Sync + 'static,
    {
        self.build_fallible(move |args: &A| Ok::<V, Infallible>(function(args)))
    }

    /// Wraps a computation whose errors are passed through to callers.
    pub fn build_fallible<A, E, F>(self, function: F) -> SafeCache<A, V, E>
    where
        A: ?Sized,
        F: Fn(&A) -> std::result::Result<V, E> + Send + Sync + 'static,
    {
        let policy = CachePolicy::from(&self.config);
        debug!(
            "cache created: maxsize={:?}, ttl={}",
            policy.maxsize(),
            policy.ttl
        );

        SafeCache {
            function: Box::new(function),
            miss_callback: self.miss_callback.unwrap_or_else(|| Box::new(|value| value)),
            policy,
            clock: self.clock,
            store: RwLock::new(CacheStore::new()),
            ledger: Mutex::new(EvictionLedger::new(policy.maxsize)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<V> Default for SafeCacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counted<V: Clone + Send + Sync + 'static>(
        builder: SafeCacheBuilder<V>,
        function: impl Fn(&i64) -> V + Send + Sync + 'static,
    ) -> (SafeCache<i64, V>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = builder.build(move |x: &i64| {
            counter.fetch_add(1, Ordering::SeqCst);
            function(x)
        });
        (cache, calls)
    }

    #[test]
    fn test_miss_then_hit() {
        let (cache, calls) = counted(SafeCacheBuilder::new(), |x| x * 2);

        assert_eq!(*cache.call(&21).unwrap(), 42);
        assert_eq!(*cache.call(&21).unwrap(), 42);

        let info = cache.cache_info();
        assert_eq!(info.misses, 1);
        assert_eq!(info.hits, 1);
        assert_eq!(info.currsize, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_expired_refresh_counts_as_hit() {
        let clock = Arc::new(ManualClock::new());
        let (cache, calls) = counted(
            SafeCacheBuilder::new().ttl(3.0).clock(clock.clone()),
            |x| vec![*x],
        );

        cache.call(&10).unwrap();
        clock.advance(Duration::from_secs(3));
        cache.call(&10).unwrap();

        let info = cache.cache_info();
        assert_eq!((info.hits, info.misses), (1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        cache.assert_consistent();
    }

    #[test]
    fn test_eviction_of_least_recently_used() {
        let (cache, _) = counted(SafeCacheBuilder::new().maxsize(2), |x| *x);

        cache.call(&1).unwrap();
        cache.call(&2).unwrap();
        cache.call(&1).unwrap();
        cache.call(&3).unwrap();

        assert!(cache.contains_key(&CacheKey::derive(&1).unwrap()));
        assert!(!cache.contains_key(&CacheKey::derive(&2).unwrap()));
        assert_eq!(
            cache.keys(),
            vec![CacheKey::derive(&1).unwrap(), CacheKey::derive(&3).unwrap()]
        );
        cache.assert_consistent();
    }

    #[test]
    fn test_miss_callback_applies_to_misses_only() {
        let clock = Arc::new(ManualClock::new());
        let cache = SafeCacheBuilder::new()
            .ttl(1.0)
            .clock(clock.clone())
            .miss_callback(|v: i64| v + 100)
            .build(|x: &i64| *x);

        assert_eq!(*cache.call(&1).unwrap(), 101);
        assert_eq!(*cache.call(&1).unwrap(), 101);

        clock.advance(Duration::from_secs(1));
        assert_eq!(*cache.call(&1).unwrap(), 1);
    }

    #[test]
    fn test_failed_computation_changes_nothing() {
        let cache = SafeCacheBuilder::new()
            .maxsize(1)
            .build_fallible(|x: &i64| if *x < 0 { Err("negative") } else { Ok(*x) });

        cache.call(&5).unwrap();
        let before = cache.cache_info();
        let keys = cache.keys();

        let err = cache.call(&-1).unwrap_err();
        assert_eq!(err.into_computation(), Some("negative"));
        assert_eq!(cache.cache_info(), before);
        assert_eq!(cache.keys(), keys);
        cache.assert_consistent();
    }

    #[test]
    fn test_cache_clear_resets_everything() {
        let (cache, _) = counted(SafeCacheBuilder::new().maxsize(4), |x| *x);
        cache.call(&1).unwrap();
        cache.call(&1).unwrap();

        cache.cache_clear();

        assert_eq!(
            cache.cache_info(),
            CacheInfo {
                hits: 0,
                misses: 0,
                maxsize: Some(4),
                currsize: 0,
            }
        );
        assert!(cache.is_empty());
        cache.assert_consistent();
    }

    #[test]
    fn test_purge_expired() {
        let clock = Arc::new(ManualClock::new());
        let (cache, _) = counted(SafeCacheBuilder::new().ttl(5.0).clock(clock.clone()), |x| *x);

        cache.call(&1).unwrap();
        clock.advance(Duration::from_secs(3));
        cache.call(&2).unwrap();
        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key(&CacheKey::derive(&2).unwrap()));
        cache.assert_consistent();

        cache.call(&1).unwrap();
        assert_eq!(cache.cache_info().misses, 3);
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig {
            maxsize: Some(0),
            ttl: Some(-1.0),
        };
        let cache = SafeCache::from_config(&config, |x: &u8| Ok::<u8, Infallible>(*x));

        assert_eq!(cache.policy().maxsize(), Some(1));
        assert_eq!(cache.policy().ttl, crate::config::Ttl::Finite(Duration::ZERO));
        assert_eq!(cache.cache_info().maxsize, Some(1));
    }

    #[test]
    fn test_debug_output() {
        let cache = SafeCacheBuilder::new().build(|x: &i64| *x);
        let debug = format!("{:?}", cache);
        assert!(debug.starts_with("SafeCache"));
        assert!(debug.contains("policy"));
    }
}
