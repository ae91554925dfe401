//! Cache Module
//!
//! Provides memoization with TTL expiration and LRU eviction.

mod canonical;
mod engine;
mod entry;
mod key;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use engine::{SafeCache, SafeCacheBuilder};
pub use entry::CacheEntry;
pub use key::{Arguments, CacheKey};
pub use lru::EvictionLedger;
pub use stats::CacheInfo;
pub use store::CacheStore;
