//! Cache Key Module
//!
//! Derives fixed-size cache keys from call arguments.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::canonical;

// == Cache Key ==
/// SHA-256 digest of a call's canonical argument encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    // == Derive ==
    /// Derives the key for one set of call arguments.
    ///
    /// Arguments are hashed through their canonical encoding, so map entries
    /// are ordered by key and a `HashMap` hashes the same no matter how it was
    /// filled. Fails if a `Serialize` impl in the arguments reports an error.
    pub fn derive<A: Serialize + ?Sized>(args: &A) -> Result<Self, serde_json::Error> {
        let encoded = canonical::encode(args)?;
        Ok(Self(Sha256::digest(&encoded).into()))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// == Arguments ==
/// A dynamically assembled argument list: positional values plus named ones.
///
/// Serializes as `[positional, named]`. Named arguments are kept sorted, so
/// the order they were added in does not affect the key. Values are stored
/// as JSON, so non-finite floats collapse to `null` here; pass a typed
/// argument struct when those must stay distinct.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Arguments {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.positional.push(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Sets a named argument, replacing any earlier value under that name.
    pub fn kwarg<T: Serialize + ?Sized>(
        mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        self.named.insert(name.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn named(&self) -> &BTreeMap<String, Value> {
        &self.named
    }

    /// Looks up a named argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }
}
