//! SQL DDL for all vexsync tables.
//!
//! Defines `records` (the canonical key-value store), `records_vec` (vec0
//! vector index), `vec_meta` (last-indexed timestamps — vec0 columns cannot
//! carry metadata), `reconcile_log` (append-only audit trail), and
//! `schema_meta`. All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Canonical key-value store. An empty value is a tombstone: the key is
-- retained for audit purposes, the record is treated as deleted.
CREATE TABLE IF NOT EXISTS records (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    sensitive INTEGER NOT NULL DEFAULT 0 CHECK(sensitive IN (0, 1)),
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_sensitive ON records(sensitive);
CREATE INDEX IF NOT EXISTS idx_records_updated ON records(updated_at);

-- Last-indexed timestamp per vector entry, maintained in lockstep with
-- records_vec by the index adapter.
CREATE TABLE IF NOT EXISTS vec_meta (
    key TEXT PRIMARY KEY,
    indexed_at TEXT NOT NULL
);

-- Append-only reconciliation audit trail. Payloads carry keys, action kinds
-- and diagnostics only — never canonical record values.
CREATE TABLE IF NOT EXISTS reconcile_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL CHECK(event_type IN (
        'drift_detected','correction_proposed','correction_applied',
        'correction_reverted','task_error')),
    payload TEXT,
    created_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table must be created separately (sqlite-vec syntax).
const VEC_TABLE_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS records_vec USING vec0(
    key TEXT PRIMARY KEY,
    embedding FLOAT[384]
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(VEC_TABLE_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"records".to_string()));
        assert!(tables.contains(&"vec_meta".to_string()));
        assert!(tables.contains(&"reconcile_log".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));

        // Verify the vec extension is live
        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schema_is_idempotent() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn audit_log_rejects_unknown_event_type() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO reconcile_log (event_type, payload, created_at) VALUES ('bogus', NULL, '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
