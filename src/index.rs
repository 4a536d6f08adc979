//! Write adapter for the derived vector index.
//!
//! The index is two tables kept in lockstep: `records_vec` (vec0 virtual
//! table holding the embedding payload) and `vec_meta` (last-indexed
//! timestamp, which vec0 columns cannot carry). During reconciliation the
//! correction executor is the only writer; mutations run inside a
//! transaction so an entry is never half-present.

use rusqlite::{params, Connection, OptionalExtension};

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Convert raw sqlite-vec bytes back to an f32 embedding.
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

/// Does an index entry exist for this key?
pub fn exists(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM vec_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// RFC 3339 timestamp of the last embedding for this key, if indexed.
pub fn last_indexed_at(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT indexed_at FROM vec_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

/// Number of entries in the index.
pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM vec_meta", [], |row| row.get(0))
}

/// Insert or replace the entry for a key, stamping `indexed_at`.
///
/// Runs in one transaction: a pre-existing entry stays in place until the
/// replacement write succeeds, so a failed update leaves the old vector
/// intact rather than a gap.
pub fn upsert(
    conn: &mut Connection,
    key: &str,
    embedding: &[f32],
    indexed_at: &str,
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    // vec0 has no ON CONFLICT support; delete-then-insert inside the tx
    tx.execute("DELETE FROM records_vec WHERE key = ?1", params![key])?;
    tx.execute(
        "INSERT INTO records_vec (key, embedding) VALUES (?1, ?2)",
        params![key, embedding_to_bytes(embedding)],
    )?;
    tx.execute(
        "INSERT OR REPLACE INTO vec_meta (key, indexed_at) VALUES (?1, ?2)",
        params![key, indexed_at],
    )?;
    tx.commit()
}

/// Remove the entry for a key, returning the removed embedding payload (or
/// `None` if the key was not indexed).
pub fn remove(conn: &mut Connection, key: &str) -> rusqlite::Result<Option<Vec<f32>>> {
    let payload: Option<Vec<u8>> = conn
        .query_row(
            "SELECT embedding FROM records_vec WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM records_vec WHERE key = ?1", params![key])?;
    tx.execute("DELETE FROM vec_meta WHERE key = ?1", params![key])?;
    tx.commit()?;

    Ok(payload.map(|bytes| bytes_to_embedding(&bytes)))
}

/// Snapshot the current entry for reversal: embedding payload + indexed_at.
pub fn snapshot(conn: &Connection, key: &str) -> rusqlite::Result<Option<(Vec<f32>, String)>> {
    let indexed_at = match last_indexed_at(conn, key)? {
        Some(ts) => ts,
        None => return Ok(None),
    };
    let payload: Option<Vec<u8>> = conn
        .query_row(
            "SELECT embedding FROM records_vec WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(payload.map(|bytes| (bytes_to_embedding(&bytes), indexed_at)))
}
