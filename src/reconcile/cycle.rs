//! One full reconciliation cycle: detect → plan → mode gate → execute.
//!
//! This is the task the heartbeat scheduler registers. Each cycle is
//! idempotent: findings are recomputed from scratch, plans are built fresh,
//! and anything a failed or skipped correction leaves behind is simply
//! re-detected next time. An execution failure for one finding does not stop
//! the rest of the cycle; a scan failure aborts it.

use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::audit::{self, EventKind};
use crate::config::ReconcilerConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::ReconcileError;
use crate::reconcile::types::Mode;
use crate::reconcile::{detect, execute, plan};

/// Summary of one reconciliation cycle, for logs and the `cycle` command.
#[derive(Debug, Default, Serialize)]
pub struct CycleReport {
    pub findings: usize,
    pub missing: usize,
    pub stale: usize,
    pub orphaned: usize,
    /// Plans recorded but not applied (`off`/`propose` mode).
    pub proposed: usize,
    /// Plans fully applied (`apply` mode).
    pub applied: usize,
    /// Plans whose execution failed; re-detected next cycle.
    pub failed: usize,
}

/// Run one detect → plan → execute pass under the configured mode and
/// ruleset. Findings are processed in detector emission order.
pub fn run_cycle(
    conn: &mut Connection,
    provider: &dyn EmbeddingProvider,
    config: &ReconcilerConfig,
) -> Result<CycleReport, ReconcileError> {
    let findings = detect::scan(conn, config.ruleset)?;

    let mut report = CycleReport {
        findings: findings.len(),
        ..CycleReport::default()
    };

    for finding in &findings {
        match finding.kind {
            crate::reconcile::types::DriftKind::MissingVector => report.missing += 1,
            crate::reconcile::types::DriftKind::StaleVector => report.stale += 1,
            crate::reconcile::types::DriftKind::OrphanedVector => report.orphaned += 1,
        }

        audit::append_event(
            conn,
            EventKind::DriftDetected,
            &serde_json::json!({
                "finding_id": finding.id,
                "kind": finding.kind.as_str(),
                "severity": finding.severity.as_str(),
                "key": finding.key,
                "details": finding.details,
            }),
        )
        .map_err(ReconcileError::audit)?;

        let correction = plan::build_plan(conn, finding)?;

        match execute::execute(conn, provider, &correction, config.mode) {
            Ok(outcome) if outcome.applied => report.applied += 1,
            Ok(_) => report.proposed += 1,
            Err(e) => {
                // Already audited by the executor; keep going with the rest
                // of the findings and let the next cycle retry this one.
                warn!(key = %finding.key, plan_id = %correction.id, error = %e,
                      "correction failed");
                report.failed += 1;
            }
        }
    }

    info!(
        findings = report.findings,
        proposed = report.proposed,
        applied = report.applied,
        failed = report.failed,
        mode = %config.mode,
        ruleset = %config.ruleset,
        "reconciliation cycle complete"
    );

    Ok(report)
}

impl CycleReport {
    /// `true` when no plan execution failed this cycle.
    pub fn clean(&self) -> bool {
        self.failed == 0
    }
}
