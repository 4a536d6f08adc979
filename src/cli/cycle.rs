//! `cycle` command — one reconciliation pass, report printed to stdout.

use anyhow::Result;

use vexsync::config::VexsyncConfig;
use vexsync::reconcile::cycle::run_cycle;
use vexsync::{db, embedding};

/// Run one detect → plan → execute pass. `--mode` and `--ruleset` override
/// the configured policy for this invocation only.
pub fn cycle(config: &VexsyncConfig, mode: Option<String>, ruleset: Option<String>) -> Result<()> {
    let mut rcfg = config.reconciler.clone();
    if let Some(m) = mode {
        rcfg.mode = m.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(r) = ruleset {
        rcfg.ruleset = r.parse().map_err(anyhow::Error::msg)?;
    }

    let mut conn = db::open_database(config.resolved_db_path())?;
    let provider = embedding::create_provider(&config.embedding)?;

    let report = run_cycle(&mut conn, provider.as_ref(), &rcfg)?;

    println!(
        "Scan ({} ruleset): {} finding(s) — {} missing, {} stale, {} orphaned",
        rcfg.ruleset, report.findings, report.missing, report.stale, report.orphaned
    );
    match (report.applied, report.proposed, report.failed) {
        (0, 0, 0) => println!("Store and index are in sync."),
        _ => println!(
            "Mode {}: {} applied, {} proposed, {} failed.",
            rcfg.mode, report.applied, report.proposed, report.failed
        ),
    }
    if report.failed > 0 {
        println!("Failed corrections are re-detected next cycle; see `vexsync log`.");
    }
    Ok(())
}
