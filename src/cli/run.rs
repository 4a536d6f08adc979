//! `run` command — the continuous reconciliation loop.
//!
//! Wires the adapters, registers the reconciliation cycle as a heartbeat
//! task, and runs the loop on a blocking thread until SIGINT. The interrupt
//! is treated exactly like an explicit stop: the flag is set, the current
//! task (if any) finishes, and the process exits 0.

use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use vexsync::audit::{self, EventKind};
use vexsync::config::VexsyncConfig;
use vexsync::heartbeat::Heartbeat;
use vexsync::reconcile::cycle::run_cycle;
use vexsync::{db, embedding};

pub async fn run(config: &VexsyncConfig) -> Result<()> {
    if !config.reconciler.enabled {
        anyhow::bail!("reconciler is disabled in config (reconciler.enabled = false)");
    }

    let db_path = config.resolved_db_path();
    let mut conn = db::open_database(&db_path).context("adapter initialization failed")?;
    let provider = embedding::create_provider(&config.embedding)?;
    let rcfg = config.reconciler.clone();

    let mut heartbeat = Heartbeat::new(Duration::from_millis(rcfg.poll_interval_ms));
    let stop = heartbeat.stop_handle();

    // Scheduler-level task failures get their own audit connection; the
    // task's connection lives inside the task closure.
    let error_conn = db::open_database(&db_path)?;
    heartbeat.on_task_error(move |name, err| {
        let result = audit::append_event(
            &error_conn,
            EventKind::TaskError,
            &serde_json::json!({ "task": name, "error": err.to_string() }),
        );
        if let Err(e) = result {
            error!(task = name, error = %e, "failed to audit task error");
        }
    });

    let task_cfg = rcfg.clone();
    heartbeat.register(
        "drift-reconciliation",
        Duration::from_secs(rcfg.interval_secs),
        move || {
            run_cycle(&mut conn, provider.as_ref(), &task_cfg)?;
            Ok(())
        },
    );

    info!(
        interval_secs = rcfg.interval_secs,
        mode = %rcfg.mode,
        ruleset = %rcfg.ruleset,
        "starting reconciliation loop (ctrl-c to stop)"
    );

    let signal_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after current task");
            signal_stop.store(true, Ordering::SeqCst);
        }
    });

    tokio::task::spawn_blocking(move || heartbeat.run())
        .await
        .context("heartbeat thread panicked")?;

    Ok(())
}
