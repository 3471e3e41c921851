//! SQLite storage layer for Foxden
//!
//! Durable state is a handful of JSON blobs in a key-value table; the
//! database only backs the `PersistenceGateway` the state store writes to.

mod kv;
mod memory;
mod migrations;
mod traits;

use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use tracing::instrument;

use crate::error::Result;

pub use kv::KvStore;
pub use memory::MemoryPersistence;
pub use traits::PersistenceGateway;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        migrations::current_version(&self.conn).unwrap_or(0)
    }

    /// Get key-value store
    pub fn kv(&self) -> KvStore<'_> {
        KvStore::new(&self.conn)
    }
}

impl PersistenceGateway for Database {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.kv().get(key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.kv().set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.kv().delete(key)
    }
}
