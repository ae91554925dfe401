//! Cache Statistics Module
//!
//! Snapshot of a cache's hit/miss counters and population.

use std::fmt;

use serde::Serialize;

// == Cache Info ==
/// Cache performance counters at the moment they were read.
///
/// Refreshing an expired entry counts as a hit, not a miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    /// Calls answered from an existing entry (fresh or refreshed)
    pub hits: u64,
    /// Calls that found no entry for their key
    pub misses: u64,
    /// Population bound, None = unbounded
    pub maxsize: Option<usize>,
    /// Current number of entries in the cache
    pub currsize: usize,
}

impl CacheInfo {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no calls have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of calls observed.
    pub fn calls(&self) -> u64 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheInfo(hits={}, misses={}, maxsize=", self.hits, self.misses)?;
        match self.maxsize {
            Some(maxsize) => write!(f, "{}", maxsize)?,
            None => f.write_str("inf")?,
        }
        write!(f, ", currsize={})", self.currsize)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn info(hits: u64, misses: u64) -> CacheInfo {
        CacheInfo {
            hits,
            misses,
            ..CacheInfo::default()
        }
    }

    #[test]
    fn test_info_default() {
        let stats = CacheInfo::default();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.maxsize, None);
        assert_eq!(stats.currsize, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(info(0, 0).hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        assert_eq!(info(3, 0).hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_all_misses() {
        assert_eq!(info(0, 2).hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = info(1, 1);
        assert_eq!(stats.hit_rate(), 0.5);
        assert_eq!(stats.calls(), 2);
    }

    #[test]
    fn test_display() {
        let bounded = CacheInfo {
            hits: 2,
            misses: 1,
            maxsize: Some(128),
            currsize: 1,
        };
        assert_eq!(
            bounded.to_string(),
            "CacheInfo(hits=2, misses=1, maxsize=128, currsize=1)"
        );
        assert_eq!(
            CacheInfo::default().to_string(),
            "CacheInfo(hits=0, misses=0, maxsize=inf, currsize=0)"
        );
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(CacheInfo {
            hits: 4,
            misses: 2,
            maxsize: None,
            currsize: 2,
        })
        .unwrap();

        assert_eq!(json["hits"], 4);
        assert_eq!(json["maxsize"], serde_json::Value::Null);
        assert_eq!(json["currsize"], 2);
    }
}
