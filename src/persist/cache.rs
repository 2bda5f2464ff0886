//! persist::cache
//!
//! Read-only view of a computation's keyed cache of intermediate results.
//! The writer uses it to fetch primary values by name and to fill the
//! debug side-channel.

use std::fmt;

use thiserror::Error;

use crate::store::value::Value;

#[derive(Debug, Error, PartialEq)]
pub enum CacheError {
    #[error("no cached value for key '{0}'")]
    Missing(String),

    #[error("failed to load '{key}': {reason}")]
    Load { key: String, reason: String },
}

/// One component of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => write!(f, "{}", s),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s)
    }
}

impl From<i64> for KeyPart {
    fn from(i: i64) -> Self {
        KeyPart::Int(i)
    }
}

impl From<i32> for KeyPart {
    fn from(i: i32) -> Self {
        KeyPart::Int(i64::from(i))
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        KeyPart::Bool(b)
    }
}

/// An ordered tuple of key parts, e.g. `("at_weights", 0)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<KeyPart>);

impl CacheKey {
    pub fn new(parts: impl IntoIterator<Item = KeyPart>) -> Self {
        Self(parts.into_iter().collect())
    }

    /// A one-part key.
    pub fn named(name: impl Into<String>) -> Self {
        Self(vec![KeyPart::Str(name.into())])
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Parts joined with `_`, e.g. `at_weights_0`.
    pub fn synthesized_name(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, ")")
    }
}

/// Builds a key from a tuple-ish list: `cache_key!["at_weights", 0]`.
#[macro_export]
macro_rules! cache_key {
    ($($part:expr),+ $(,)?) => {
        $crate::persist::cache::CacheKey::new(vec![
            $($crate::persist::cache::KeyPart::from($part)),+
        ])
    };
}

pub trait Cache {
    /// Every key, in the cache's own order.
    fn keys(&self) -> Vec<CacheKey>;

    fn load(&self, key: &CacheKey) -> Result<Value, CacheError>;
}

/// In-memory cache that remembers insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Vec<(CacheKey, Value)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value for `key`.
    pub fn insert(&mut self, key: CacheKey, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache for MemoryCache {
    fn keys(&self) -> Vec<CacheKey> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    fn load(&self, key: &CacheKey) -> Result<Value, CacheError> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| CacheError::Missing(key.to_string()))
    }
}
