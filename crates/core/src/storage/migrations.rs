//! Schema migrations
//!
//! Each step runs once, inside its own transaction, and is recorded in
//! `schema_migrations`.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{info, instrument};

use crate::error::Result;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Versions start at 1 and increase by one
const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "kv_store",
        sql: "CREATE TABLE IF NOT EXISTS kv_store (
                  key TEXT PRIMARY KEY,
                  value TEXT NOT NULL,
                  updated_at TEXT NOT NULL
              );",
    },
    Step {
        version: 2,
        name: "kv_store updated_at index",
        sql: "CREATE INDEX IF NOT EXISTS idx_kv_store_updated ON kv_store(updated_at);",
    },
];

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

/// Highest applied version; 0 for a fresh database
pub(crate) fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn.query_row(
        "SELECT MAX(version) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version.unwrap_or_default())
}

fn apply(conn: &Connection, step: &Step) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(step.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        params![step.version, step.name, Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

/// Bring the schema up to the latest version
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    run_up_to(conn, u32::MAX)
}

fn run_up_to(conn: &Connection, target: u32) -> Result<()> {
    conn.execute_batch(LEDGER_DDL)?;

    let start = current_version(conn)?;
    let mut applied = 0;
    for step in STEPS
        .iter()
        .filter(|s| s.version > start && s.version <= target)
    {
        info!(version = step.version, name = step.name, "Applying migration");
        apply(conn, step)?;
        applied += 1;
    }

    if applied > 0 {
        info!(from = start, to = current_version(conn)?, "Schema migrated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_exists(conn: &Connection) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_kv_store_updated'",
            [],
            |row| row.get::<_, u32>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn fresh_database_reaches_latest() {
        let conn = Connection::open_in_memory().unwrap();
        run_up_to(&conn, 0).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);

        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), STEPS.len() as u32);
        assert!(index_exists(&conn));
    }

    #[test]
    fn rerun_records_nothing_new() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, STEPS.len() as u32);
    }

    #[test]
    fn older_schema_is_upgraded() {
        let conn = Connection::open_in_memory().unwrap();
        run_up_to(&conn, 1).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 1);
        assert!(!index_exists(&conn));

        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 2);
        assert!(index_exists(&conn));
    }

    #[test]
    fn versions_are_contiguous() {
        for (expected, step) in (1..).zip(STEPS) {
            assert_eq!(step.version, expected, "step {}", step.name);
        }
    }
}
