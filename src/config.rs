//! Configuration Module
//!
//! Raw cache options, loading them from environment variables, and the
//! normalized policy the engine actually runs with.

use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use tracing::warn;

/// Environment variable holding the maximum number of cached entries.
pub const MAXSIZE_ENV: &str = "SAFECACHE_MAXSIZE";

/// Environment variable holding the entry time-to-live in seconds.
pub const TTL_ENV: &str = "SAFECACHE_TTL";

/// Cache options as supplied by the caller.
///
/// Values are taken verbatim; normalization happens in [`CachePolicy::from`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries, `None` = unbounded
    pub maxsize: Option<i64>,
    /// Freshness window in seconds, `None` = never expires
    pub ttl: Option<f64>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SAFECACHE_MAXSIZE` - Maximum cache entries (default: unbounded)
    /// - `SAFECACHE_TTL` - Entry TTL in seconds, `inf` allowed (default: never expires)
    pub fn from_env() -> Self {
        Self {
            maxsize: env::var(MAXSIZE_ENV).ok().and_then(|v| v.trim().parse().ok()),
            ttl: env::var(TTL_ENV).ok().and_then(|v| v.trim().parse().ok()),
        }
    }
}

// == Ttl ==
/// Normalized time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entries never expire
    Infinite,
    /// Entries expire this long after they are stored
    Finite(Duration),
}

impl Ttl {
    /// Normalizes a TTL given in seconds.
    ///
    /// `None`, `+inf` and durations too large to represent are infinite.
    /// Zero, negative and NaN collapse to zero: every call recomputes.
    pub fn from_secs(ttl: Option<f64>) -> Self {
        let Some(secs) = ttl else {
            return Ttl::Infinite;
        };
        if secs.is_nan() || secs <= 0.0 {
            return Ttl::Finite(Duration::ZERO);
        }
        match Duration::try_from_secs_f64(secs) {
            Ok(duration) => Ttl::Finite(duration),
            Err(_) => Ttl::Infinite,
        }
    }

    /// Returns the window, or `None` when infinite.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Ttl::Infinite => None,
            Ttl::Finite(duration) => Some(*duration),
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Ttl::Infinite)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Infinite => write!(f, "inf"),
            Ttl::Finite(duration) => write!(f, "{}s", duration.as_secs_f64()),
        }
    }
}

// == Cache Policy ==
/// The normalized limits a cache engine is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Population bound, `None` = unbounded
    pub maxsize: Option<NonZeroUsize>,
    /// Entry freshness window
    pub ttl: Ttl,
}

impl CachePolicy {
    /// Returns the population bound as a plain count.
    pub fn maxsize(&self) -> Option<usize> {
        self.maxsize.map(NonZeroUsize::get)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        let maxsize = config.maxsize.map(|n| {
            if n <= 0 {
                warn!("maxsize {} normalized to 1", n);
            }
            usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .unwrap_or(NonZeroUsize::MIN)
        });

        if let Some(secs) = config.ttl.filter(|secs| secs.is_nan() || *secs <= 0.0) {
            warn!("ttl {} normalized to 0, every call will recompute", secs);
        }

        Self {
            maxsize,
            ttl: Ttl::from_secs(config.ttl),
        }
    }
}
