//! Storage gateway traits
//!
//! The state store only ever talks to durable storage through this trait,
//! allowing for different backends (SQLite, in-memory, platform store).

use serde_json::Value;

use crate::error::Result;

/// Key-value persistence used for state snapshots
pub trait PersistenceGateway {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn delete(&self, key: &str) -> Result<()>;
}
