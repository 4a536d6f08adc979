//! Core reconciliation type definitions.
//!
//! Defines [`DriftKind`] (the three drift classes), [`Severity`], [`Mode`]
//! (the off/propose/apply safety gate), [`Ruleset`], and the finding/plan
//! structures that flow from detection through execution.

use serde::{Deserialize, Serialize};

/// The three classes of drift between the canonical store and the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// A live, non-sensitive record has no index entry — the embedding step
    /// failed or was skipped on create.
    MissingVector,
    /// The record changed after its last embedding (any positive delta).
    StaleVector,
    /// An index entry exists for a key that is tombstoned, absent, or
    /// sensitive — it should not exist at all.
    OrphanedVector,
}

impl DriftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingVector => "missing_vector",
            Self::StaleVector => "stale_vector",
            Self::OrphanedVector => "orphaned_vector",
        }
    }
}

impl std::fmt::Display for DriftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a finding. A pure function of `(DriftKind, Ruleset)` — see
/// [`crate::reconcile::detect::severity_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating mode for the correction executor.
///
/// `Off` and `Propose` never touch the index; both record what *would* be
/// done. `Propose` is the expected mode for generating plans an operator
/// later promotes to `Apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Off,
    Propose,
    Apply,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Propose => "propose",
            Self::Apply => "apply",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "propose" => Ok(Self::Propose),
            "apply" => Ok(Self::Apply),
            _ => Err(format!("unknown mode: {s} (expected off|propose|apply)")),
        }
    }
}

/// Severity ruleset applied during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ruleset {
    /// Every finding is high severity.
    Strict,
    /// Missing/stale are medium, orphaned is low.
    Lenient,
}

impl Ruleset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl std::fmt::Display for Ruleset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ruleset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(format!("unknown ruleset: {s} (expected strict|lenient)")),
        }
    }
}

/// One detected inconsistency between the canonical store and the index.
///
/// Findings are recomputed fresh on every scan and never persisted — if drift
/// survives a failed or skipped correction, the next cycle re-detects it.
#[derive(Debug, Clone, Serialize)]
pub struct DriftFinding {
    /// UUID v7 (time-sortable), unique per detection pass.
    pub id: String,
    pub kind: DriftKind,
    pub severity: Severity,
    /// Canonical record key this finding refers to.
    pub key: String,
    /// Free-form diagnostics (timestamps, orphan cause). Never record values.
    pub details: serde_json::Value,
}

/// Kind of index mutation a correction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AddVector,
    UpdateVector,
    RemoveVector,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddVector => "add_vector",
            Self::UpdateVector => "update_vector",
            Self::RemoveVector => "remove_vector",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single index mutation. Immutable once created.
///
/// For `UpdateVector` and `RemoveVector` the planner captures the prior index
/// entry under `metadata["prior"]` (embedding payload + indexed_at), which is
/// what makes later reversal possible.
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionAction {
    pub kind: ActionKind,
    pub key: String,
    pub metadata: serde_json::Value,
}

/// A reversible correction for one finding.
///
/// Built by the planner, consumed once by the executor under a given mode.
/// Plans are not reused across cycles — persistent drift gets a fresh plan.
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionPlan {
    /// UUID v7, unique per plan.
    pub id: String,
    /// Back-reference to the finding this plan corrects.
    pub finding_id: String,
    /// Actions in execution order. Exactly one today; the list form keeps
    /// multi-step corrections structurally possible.
    pub actions: Vec<CorrectionAction>,
    /// Human-readable summary for propose-mode review. Carries the action
    /// kind, key, and snapshot reference — never the record value.
    pub preview: String,
}
