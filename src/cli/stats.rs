//! `stats` command — store, index, and drift counts.

use anyhow::Result;

use vexsync::config::VexsyncConfig;
use vexsync::reconcile::detect;
use vexsync::reconcile::types::DriftKind;
use vexsync::{db, index};

pub fn stats(config: &VexsyncConfig) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;

    let total: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?;
    let tombstoned: i64 =
        conn.query_row("SELECT COUNT(*) FROM records WHERE value = ''", [], |r| {
            r.get(0)
        })?;
    let sensitive: i64 = conn.query_row(
        "SELECT COUNT(*) FROM records WHERE sensitive = 1",
        [],
        |r| r.get(0),
    )?;
    let indexed = index::count(&conn)?;
    let events: i64 = conn.query_row("SELECT COUNT(*) FROM reconcile_log", [], |r| r.get(0))?;

    println!("Canonical store:");
    println!("  records:    {total} ({tombstoned} tombstoned, {sensitive} sensitive)");
    println!("Vector index:");
    println!("  entries:    {indexed}");
    println!("Audit log:");
    println!("  events:     {events}");

    let findings = detect::scan(&conn, config.reconciler.ruleset)?;
    if findings.is_empty() {
        println!("Drift: none — store and index are in sync.");
    } else {
        let count_kind = |kind: DriftKind| findings.iter().filter(|f| f.kind == kind).count();
        println!("Drift ({} ruleset):", config.reconciler.ruleset);
        println!("  missing:    {}", count_kind(DriftKind::MissingVector));
        println!("  stale:      {}", count_kind(DriftKind::StaleVector));
        println!("  orphaned:   {}", count_kind(DriftKind::OrphanedVector));
    }
    Ok(())
}
