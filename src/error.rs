//! Error taxonomy for the reconciliation engine.
//!
//! Read failures abort only the current scan cycle; write failures abort the
//! current plan's remaining actions; task failures are isolated by the
//! heartbeat scheduler. "Not reversible" is deliberately *not* an error — it
//! is a tagged outcome ([`crate::reconcile::execute::RevertOutcome`]) so
//! callers cannot mistake "nothing to undo" for "successfully undone".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Canonical store or index was unreachable during detection or planning.
    /// The current cycle is skipped; the next heartbeat tick retries.
    #[error("adapter read failed: {source}")]
    AdapterRead {
        #[source]
        source: rusqlite::Error,
    },

    /// An index mutation failed while applying a plan. Remaining actions are
    /// not attempted and no automatic retry happens.
    #[error(
        "plan {plan_id} failed at action {action} ({succeeded} action(s) had succeeded): {message}"
    )]
    AdapterWrite {
        plan_id: String,
        action: usize,
        succeeded: usize,
        message: String,
    },

    /// Appending to the audit log failed. Surfaced rather than swallowed —
    /// a correction without an audit trail must not look successful.
    #[error("audit append failed: {source}")]
    Audit {
        #[source]
        source: rusqlite::Error,
    },

    /// A registered heartbeat task failed. Isolated per task by the scheduler.
    #[error("task {name} failed: {message}")]
    Task { name: String, message: String },
}

impl ReconcileError {
    pub fn read(source: rusqlite::Error) -> Self {
        Self::AdapterRead { source }
    }

    pub fn audit(source: rusqlite::Error) -> Self {
        Self::Audit { source }
    }
}
