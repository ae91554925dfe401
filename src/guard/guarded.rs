//! Mutation Guard
//!
//! Wraps values leaving the cache so that mutable results are always
//! independent copies.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::immutable::is_mutable;

// == Guarded ==
/// A value handed out by the cache.
#[derive(Clone, PartialEq)]
pub enum Guarded<V> {
    /// Immutable value, sharing the cached allocation
    Shared(Arc<V>),
    /// Clone of a mutable value, owned by the caller
    Copied(V),
}

impl<V> Guarded<V> {
    // == Is Shared ==
    /// Returns true if this value aliases the cached allocation.
    pub fn is_shared(&self) -> bool {
        matches!(self, Guarded::Shared(_))
    }

    /// Returns the shared allocation, if any.
    pub fn as_shared(&self) -> Option<&Arc<V>> {
        match self {
            Guarded::Shared(value) => Some(value),
            Guarded::Copied(_) => None,
        }
    }

    /// Mutable access to a copied value. Shared values are never writable.
    pub fn get_mut(&mut self) -> Option<&mut V> {
        match self {
            Guarded::Shared(_) => None,
            Guarded::Copied(value) => Some(value),
        }
    }

    // == Into Inner ==
    /// Unwraps into an owned value, cloning a shared one if still aliased.
    pub fn into_inner(self) -> V
    where
        V: Clone,
    {
        match self {
            Guarded::Shared(value) => Arc::unwrap_or_clone(value),
            Guarded::Copied(value) => value,
        }
    }
}

impl<V> Deref for Guarded<V> {
    type Target = V;

    fn deref(&self) -> &V {
        match self {
            Guarded::Shared(value) => &**value,
            Guarded::Copied(value) => value,
        }
    }
}

impl<V> AsRef<V> for Guarded<V> {
    fn as_ref(&self) -> &V {
        &**self
    }
}

impl<V: fmt::Debug> fmt::Debug for Guarded<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<V: fmt::Display> fmt::Display for Guarded<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

// == Guard ==
/// Applies the mutation policy to a cached value.
///
/// Mutable values are cloned on every call, not only the first. The copy is
/// only as deep as `V::clone`: owned containers are fully independent, but a
/// shared handle such as `Arc<Mutex<T>>` clones the handle, so writes through
/// it still reach the cached value.
pub fn guard<V: Clone + 'static>(value: &Arc<V>) -> Guarded<V> {
    if is_mutable(&**value) {
        Guarded::Copied((**value).clone())
    } else {
        Guarded::Shared(Arc::clone(value))
    }
}

// == Mutation Guard ==
/// Wraps a function returning shared values so its results go through [`guard`].
pub fn mutation_guard<A, V, F>(function: F) -> impl Fn(&A) -> Guarded<V>
where
    A: ?Sized,
    V: Clone + 'static,
    F: Fn(&A) -> Arc<V>,
{
    move |args: &A| guard(&function(args))
}
