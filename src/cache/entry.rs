//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Ttl;

// == Cache Entry ==
/// A computed value together with its expiry stamp.
///
/// Entries are never mutated after construction; a refresh replaces the
/// whole entry.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: Arc<V>,
    /// When the value was stored
    pub created_at: Instant,
    /// When the value stops being fresh, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now` - Current clock reading
    /// * `ttl` - Freshness window
    pub fn new(value: V, now: Instant, ttl: Ttl) -> Self {
        // An expiry past the end of representable time never arrives.
        let expires_at = ttl.as_duration().and_then(|ttl| now.checked_add(ttl));

        Self {
            value: Arc::new(value),
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now` reaches its expiry,
    /// equality included. With a zero TTL every entry is expired immediately.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining freshness window, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }

    /// Time since the entry was stored.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}
