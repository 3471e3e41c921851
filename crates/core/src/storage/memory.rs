//! In-memory persistence backend
//!
//! Used for tests and for sessions that should leave nothing on disk.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde_json::Value;

use super::traits::PersistenceGateway;
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct MemoryPersistence {
    entries: RefCell<HashMap<String, Value>>,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-populated entries
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        let store = Self::new();
        store.entries.borrow_mut().extend(entries);
        store
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Make every subsequent `set` fail
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.set(failing);
    }

    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }
}

impl PersistenceGateway for MemoryPersistence {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::Persistence(format!("write to {key} rejected")));
        }
        self.entries.borrow_mut().insert(key.to_string(), value.clone());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
