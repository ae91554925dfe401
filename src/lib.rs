//! safecache - A thread-safe and mutation-safe memoization cache
//!
//! Wraps a computation so repeated calls with equal arguments return the
//! stored result, with TTL expiration, LRU eviction and defensive copies of
//! mutable results.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;

pub use cache::{Arguments, CacheInfo, CacheKey, SafeCache, SafeCacheBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CachePolicy, Ttl};
pub use error::CacheError;
pub use guard::{is_immutable, is_mutable, mutation_guard, Guarded, IMMUTABLE_TYPES};
