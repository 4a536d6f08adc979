#![allow(dead_code)]

use rusqlite::Connection;
use vexsync::config::ReconcilerConfig;
use vexsync::db;
use vexsync::reconcile::types::{Mode, Ruleset};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Deterministic 384-dim embedding with a spike at position `seed`.
pub fn test_embedding(seed: u8) -> Vec<f32> {
    let mut v = vec![0.0f32; 384];
    v[seed as usize % 384] = 1.0;
    v
}

/// Reconciler config with the given policy and fast test timings.
pub fn reconciler_config(mode: Mode, ruleset: Ruleset) -> ReconcilerConfig {
    ReconcilerConfig {
        enabled: true,
        mode,
        ruleset,
        interval_secs: 1,
        poll_interval_ms: 10,
    }
}

/// A timestamp far enough in the past that any fresh record write is newer.
pub const OLD_TS: &str = "2020-01-01T00:00:00+00:00";

/// A timestamp far enough in the future that no fresh record write is newer.
pub const FUTURE_TS: &str = "2999-01-01T00:00:00+00:00";
