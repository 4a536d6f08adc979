//! Canonical-store commands — `put`, `get`, `rm`.
//!
//! These are the surrounding system's write surface. Writes touch only the
//! `records` table; the vector index catches up when the reconciler next
//! runs, which is exactly the drift the engine exists to close.

use anyhow::Result;

use vexsync::config::VexsyncConfig;
use vexsync::{db, index, store};

pub fn put(config: &VexsyncConfig, key: &str, value: &str, sensitive: bool) -> Result<()> {
    anyhow::ensure!(!value.is_empty(), "empty values are tombstones; use `vexsync rm`");

    let conn = db::open_database(config.resolved_db_path())?;
    store::put_record(&conn, key, value, sensitive)?;

    if sensitive {
        println!("Stored sensitive record '{key}' (will never be indexed).");
    } else {
        println!("Stored record '{key}' (indexed on next reconciliation cycle).");
    }
    Ok(())
}

pub fn get(config: &VexsyncConfig, key: &str) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;

    match store::read_one(&conn, key)? {
        None => {
            println!("No record for key '{key}'.");
        }
        Some(rec) if rec.is_tombstoned() => {
            println!("Record '{key}' is tombstoned (deleted {}).", rec.updated_at);
        }
        Some(rec) => {
            let indexed = match index::last_indexed_at(&conn, key)? {
                Some(ts) => format!("indexed at {ts}"),
                None => "not indexed".to_string(),
            };
            println!("{} = {}", rec.key, rec.value);
            println!(
                "  sensitive: {}, updated at {}, {}",
                rec.sensitive, rec.updated_at, indexed
            );
        }
    }
    Ok(())
}

pub fn rm(config: &VexsyncConfig, key: &str) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;

    if store::tombstone_record(&conn, key)? {
        println!("Tombstoned record '{key}' (index entry removed on next cycle).");
    } else {
        println!("No record for key '{key}'.");
    }
    Ok(())
}
