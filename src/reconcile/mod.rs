//! Drift detection, correction planning, and execution.
//!
//! One reconciliation cycle is detect → plan → mode gate → execute:
//! [`detect::scan`] produces findings, [`plan::build_plan`] turns each into a
//! reversible [`types::CorrectionPlan`], and [`execute::execute`] applies the
//! plan (or records it, in `off`/`propose` mode). [`cycle::run_cycle`] drives
//! the whole pass and is what the heartbeat scheduler registers as a task.

pub mod cycle;
pub mod detect;
pub mod execute;
pub mod plan;
pub mod types;
