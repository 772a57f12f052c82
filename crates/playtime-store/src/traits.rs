//! Store trait definitions

use serde::{Deserialize, Serialize};

use crate::StoreResult;

/// A single value in the key-path store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Int(i64),
    Text(String),
}

impl StoredValue {
    /// Non-negative integer view; anything else reads as absent.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            StoredValue::Int(i) => u64::try_from(*i).ok(),
            StoredValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::Text(s) => Some(s),
            StoredValue::Int(_) => None,
        }
    }
}

impl From<u64> for StoredValue {
    fn from(v: u64) -> Self {
        StoredValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for StoredValue {
    fn from(v: &str) -> Self {
        StoredValue::Text(v.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(v: String) -> Self {
        StoredValue::Text(v)
    }
}

/// Durable key-value store addressed by dotted paths.
///
/// Writes must be visible to subsequent reads right away, but only become
/// durable once [`KeyValueStore::flush`] succeeds. There is no transaction
/// spanning several keys.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>>;

    /// Write a value (pending until flushed)
    fn set(&self, key: &str, value: StoredValue) -> StoreResult<()>;

    /// All keys starting with `prefix`, flushed or pending, in sorted order
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Make every pending write durable
    fn flush(&self) -> StoreResult<()>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
