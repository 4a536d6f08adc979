//! Read view over the canonical key-value store.
//!
//! The `records` table is the single source of truth. The reconciliation
//! engine only ever reads it; [`put_record`] and [`tombstone_record`] exist
//! for the surrounding system's write surface (the `put`/`rm` CLI commands)
//! and are never called from the detect/plan/execute path.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// A canonical record as stored in the `records` table.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalRecord {
    /// Unique, case-preserving key.
    pub key: String,
    /// Record value. The empty string means tombstoned — the key is kept for
    /// audit purposes, the record is treated as deleted.
    pub value: String,
    /// Sensitive records are never scanned into or surfaced by the index.
    pub sensitive: bool,
    /// RFC 3339 UTC timestamp of the last write.
    pub updated_at: String,
}

impl CanonicalRecord {
    /// A tombstoned record's value is the empty string; the row is never
    /// physically removed.
    pub fn is_tombstoned(&self) -> bool {
        self.value.is_empty()
    }
}

/// Read a single record by key.
pub fn read_one(conn: &Connection, key: &str) -> rusqlite::Result<Option<CanonicalRecord>> {
    conn.query_row(
        "SELECT key, value, sensitive, updated_at FROM records WHERE key = ?1",
        params![key],
        |row| {
            Ok(CanonicalRecord {
                key: row.get(0)?,
                value: row.get(1)?,
                sensitive: row.get::<_, i64>(2)? != 0,
                updated_at: row.get(3)?,
            })
        },
    )
    .optional()
}

/// Read all records in key order (tombstones included).
pub fn read_all(conn: &Connection) -> rusqlite::Result<Vec<CanonicalRecord>> {
    let mut stmt =
        conn.prepare("SELECT key, value, sensitive, updated_at FROM records ORDER BY key")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CanonicalRecord {
                key: row.get(0)?,
                value: row.get(1)?,
                sensitive: row.get::<_, i64>(2)? != 0,
                updated_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Insert or overwrite a record. Surrounding-system write surface only.
///
/// Deliberately does not touch the vector index — keeping the index in step
/// is the reconciler's job, which is what makes a fresh `put` show up as a
/// `missing_vector` finding on the next scan.
pub fn put_record(
    conn: &Connection,
    key: &str,
    value: &str,
    sensitive: bool,
) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO records (key, value, sensitive, updated_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(key) DO UPDATE SET value = ?2, sensitive = ?3, updated_at = ?4",
        params![key, value, sensitive as i64, now],
    )?;
    Ok(())
}

/// Soft-delete a record by clearing its value. Returns `false` if the key
/// does not exist. Surrounding-system write surface only.
pub fn tombstone_record(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let now = chrono::Utc::now().to_rfc3339();
    let affected = conn.execute(
        "UPDATE records SET value = '', updated_at = ?1 WHERE key = ?2",
        params![now, key],
    )?;
    Ok(affected > 0)
}
