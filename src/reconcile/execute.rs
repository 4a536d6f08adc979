//! Correction execution under the off/propose/apply mode gate, plus
//! best-effort reversal.
//!
//! `off` and `propose` never touch the index — both record the plan as an
//! audit event and return. `apply` performs the plan's actions in order and
//! stops at the first failure without retrying; the audit trail and the
//! returned error say which actions had succeeded so an operator can decide
//! on remediation. Reversal restores the snapshot captured at plan time, or
//! reports [`RevertOutcome::NotReversible`] when no snapshot exists.

use rusqlite::Connection;
use serde::Serialize;

use crate::audit::{self, EventKind};
use crate::embedding::EmbeddingProvider;
use crate::error::ReconcileError;
use crate::reconcile::types::{ActionKind, CorrectionAction, CorrectionPlan, Mode};
use crate::{index, store};

/// Result of one execution attempt.
#[derive(Debug, Serialize)]
pub struct ExecuteOutcome {
    /// `true` only when the mode was `apply` and every action succeeded.
    pub applied: bool,
    pub message: String,
}

/// Result of one reversal attempt. A tagged type so callers cannot mistake
/// "nothing to do" for "successfully undone".
#[derive(Debug, PartialEq, Serialize)]
pub enum RevertOutcome {
    Reverted,
    NotReversible { reason: String },
}

/// Execute a plan under the given mode. Emits exactly one audit event for
/// the attempt: `correction_proposed` (off/propose), `correction_applied`
/// (apply success), or `task_error` (apply failure, which is also returned
/// to the caller).
pub fn execute(
    conn: &mut Connection,
    provider: &dyn EmbeddingProvider,
    plan: &CorrectionPlan,
    mode: Mode,
) -> Result<ExecuteOutcome, ReconcileError> {
    let action_summary: Vec<serde_json::Value> = plan
        .actions
        .iter()
        .map(|a| serde_json::json!({ "kind": a.kind.as_str(), "key": a.key }))
        .collect();

    match mode {
        Mode::Off | Mode::Propose => {
            audit::append_event(
                conn,
                EventKind::CorrectionProposed,
                &serde_json::json!({
                    "plan_id": plan.id,
                    "finding_id": plan.finding_id,
                    "mode": mode.as_str(),
                    "preview_only": true,
                    "actions": action_summary,
                    "preview": plan.preview,
                }),
            )
            .map_err(ReconcileError::audit)?;

            Ok(ExecuteOutcome {
                applied: false,
                message: format!(
                    "plan {} recorded in {} mode; index untouched",
                    plan.id, mode
                ),
            })
        }
        Mode::Apply => {
            let mut succeeded = 0usize;
            for (i, action) in plan.actions.iter().enumerate() {
                if let Err(message) = apply_action(conn, provider, action) {
                    // Stop here: no retry, no silently continuing past a
                    // failed step. Record how far we got.
                    audit::append_event(
                        conn,
                        EventKind::TaskError,
                        &serde_json::json!({
                            "plan_id": plan.id,
                            "finding_id": plan.finding_id,
                            "failed_action": i,
                            "action_kind": action.kind.as_str(),
                            "key": action.key,
                            "succeeded_actions": succeeded,
                            "error": message,
                        }),
                    )
                    .map_err(ReconcileError::audit)?;

                    return Err(ReconcileError::AdapterWrite {
                        plan_id: plan.id.clone(),
                        action: i,
                        succeeded,
                        message,
                    });
                }
                succeeded += 1;
            }

            audit::append_event(
                conn,
                EventKind::CorrectionApplied,
                &serde_json::json!({
                    "plan_id": plan.id,
                    "finding_id": plan.finding_id,
                    "actions": action_summary,
                    "succeeded_actions": succeeded,
                }),
            )
            .map_err(ReconcileError::audit)?;

            Ok(ExecuteOutcome {
                applied: true,
                message: format!("plan {} applied ({succeeded} action(s))", plan.id),
            })
        }
    }
}

/// Perform one index mutation. Errors come back as strings; the caller wraps
/// them with plan context.
fn apply_action(
    conn: &mut Connection,
    provider: &dyn EmbeddingProvider,
    action: &CorrectionAction,
) -> Result<(), String> {
    match action.kind {
        ActionKind::AddVector | ActionKind::UpdateVector => {
            let record = store::read_one(conn, &action.key)
                .map_err(|e| format!("canonical read failed: {e}"))?
                .filter(|r| !r.is_tombstoned() && !r.sensitive)
                .ok_or_else(|| {
                    // The record changed between scan and apply. Leave the
                    // index alone; the next cycle re-detects whatever state
                    // remains.
                    format!("canonical record '{}' no longer eligible", action.key)
                })?;

            // Embed first, write second: the old entry stays in place until
            // the replacement write succeeds.
            let embedding = provider
                .embed(&record.value)
                .map_err(|e| format!("embedding failed: {e}"))?;

            index::upsert(conn, &action.key, &embedding, &record.updated_at)
                .map_err(|e| format!("index write failed: {e}"))?;
            Ok(())
        }
        ActionKind::RemoveVector => {
            index::remove(conn, &action.key)
                .map_err(|e| format!("index remove failed: {e}"))?;
            Ok(())
        }
    }
}

/// Best-effort reversal of a previously applied plan.
///
/// Actions are undone in reverse order. `add_vector` reverses by removing
/// the key; `update_vector` and `remove_vector` reverse only if the prior
/// entry was snapshotted at plan time. Emits exactly one
/// `correction_reverted` event per attempt, whether or not it succeeds.
pub fn revert(
    conn: &mut Connection,
    plan: &CorrectionPlan,
) -> Result<RevertOutcome, ReconcileError> {
    for (i, action) in plan.actions.iter().enumerate().rev() {
        match revert_action(conn, action) {
            Ok(RevertOutcome::Reverted) => {}
            Ok(RevertOutcome::NotReversible { reason }) => {
                audit::append_event(
                    conn,
                    EventKind::CorrectionReverted,
                    &serde_json::json!({
                        "plan_id": plan.id,
                        "reverted": false,
                        "reason": reason,
                    }),
                )
                .map_err(ReconcileError::audit)?;
                return Ok(RevertOutcome::NotReversible { reason });
            }
            Err(e) => {
                audit::append_event(
                    conn,
                    EventKind::TaskError,
                    &serde_json::json!({
                        "plan_id": plan.id,
                        "key": action.key,
                        "error": format!("revert failed: {e}"),
                    }),
                )
                .map_err(ReconcileError::audit)?;
                return Err(ReconcileError::AdapterWrite {
                    plan_id: plan.id.clone(),
                    action: i,
                    succeeded: 0,
                    message: format!("revert failed: {e}"),
                });
            }
        }
    }

    audit::append_event(
        conn,
        EventKind::CorrectionReverted,
        &serde_json::json!({ "plan_id": plan.id, "reverted": true }),
    )
    .map_err(ReconcileError::audit)?;

    Ok(RevertOutcome::Reverted)
}

fn revert_action(
    conn: &mut Connection,
    action: &CorrectionAction,
) -> Result<RevertOutcome, rusqlite::Error> {
    match action.kind {
        ActionKind::AddVector => {
            index::remove(conn, &action.key)?;
            Ok(RevertOutcome::Reverted)
        }
        ActionKind::UpdateVector | ActionKind::RemoveVector => {
            match parse_prior(&action.metadata) {
                Some((embedding, indexed_at)) => {
                    index::upsert(conn, &action.key, &embedding, &indexed_at)?;
                    Ok(RevertOutcome::Reverted)
                }
                None => Ok(RevertOutcome::NotReversible {
                    reason: format!(
                        "no prior snapshot for key '{}' — {} cannot be undone",
                        action.key, action.kind
                    ),
                }),
            }
        }
    }
}

/// Extract the prior-entry snapshot from action metadata, if captured.
fn parse_prior(metadata: &serde_json::Value) -> Option<(Vec<f32>, String)> {
    let prior = metadata.get("prior")?;
    let embedding: Vec<f32> = serde_json::from_value(prior.get("embedding")?.clone()).ok()?;
    let indexed_at = prior.get("indexed_at")?.as_str()?.to_string();
    Some((embedding, indexed_at))
}
