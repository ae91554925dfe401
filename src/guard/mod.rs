//! Guard Module
//!
//! Keeps callers from mutating cached values through the objects they are
//! handed. Values of a known-immutable type are shared with the cache; every
//! other value is cloned on the way out, which isolates the caller as long
//! as the type's `Clone` does not share state.

mod guarded;
mod immutable;

pub use guarded::{guard, mutation_guard, Guarded};
pub use immutable::{is_immutable, is_mutable, IMMUTABLE_TYPES};
