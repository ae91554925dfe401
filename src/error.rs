//! Error types for the memoization cache
//!
//! Provides unified error handling using thiserror.

use std::convert::Infallible;

use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced to callers of a cached computation.
///
/// Misses and expirations are resolved inside the engine and never show up
/// here. `E` is the wrapped computation's own error type.
#[derive(Error, Debug)]
pub enum CacheError<E = Infallible> {
    /// The call arguments could not be serialized into a cache key
    #[error("Unhashable argument: {0}")]
    UnhashableArgument(#[from] serde_json::Error),

    /// The wrapped computation failed; nothing was cached
    #[error(transparent)]
    Computation(E),
}

impl<E> CacheError<E> {
    // == Into Computation ==
    /// Returns the wrapped computation's error, if that is what this is.
    pub fn into_computation(self) -> Option<E> {
        match self {
            CacheError::Computation(err) => Some(err),
            CacheError::UnhashableArgument(_) => None,
        }
    }

    // == Is Unhashable ==
    /// Returns true if the call failed during key derivation.
    pub fn is_unhashable(&self) -> bool {
        matches!(self, CacheError::UnhashableArgument(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cached calls.
pub type Result<T, E = Infallible> = std::result::Result<T, CacheError<E>>;
