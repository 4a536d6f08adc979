//! `log` command — print recent reconciliation audit events.

use anyhow::Result;

use vexsync::audit;
use vexsync::config::VexsyncConfig;
use vexsync::db;

pub fn log(config: &VexsyncConfig, limit: usize) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;
    let events = audit::recent_events(&conn, limit)?;

    if events.is_empty() {
        println!("No reconciliation events logged yet.");
        return Ok(());
    }

    println!("{:<6} {:<22} {:<27} payload", "id", "event", "at");
    println!("{}", "-".repeat(90));
    for event in &events {
        let payload = event
            .payload
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default();
        println!(
            "{:<6} {:<22} {:<27} {}",
            event.id, event.event_type, event.created_at, payload
        );
    }
    Ok(())
}
