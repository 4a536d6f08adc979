//! Reconciliation engine for a canonical key-value store and its derived
//! vector index.
//!
//! The key-value store (the `records` table) is the single source of truth.
//! The vector index (`records_vec` + `vec_meta`) is a rebuildable
//! similarity-search overlay that can drift out of sync through partial
//! writes, deletions, or embedding failures. vexsync periodically detects
//! that drift, turns each finding into a reversible correction plan, and
//! executes plans under a configurable safety policy (`off`/`propose`/
//! `apply`), writing a privacy-filtered audit trail for every step.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   for the vector index; WAL mode for concurrent readers
//! - **Detection**: three drift rules (missing, stale, orphaned vectors)
//!   evaluated in a single streaming pass per cycle
//! - **Correction**: one plan per finding, executed in order, with prior-entry
//!   snapshots captured at plan time for best-effort reversal
//! - **Scheduling**: a cooperative single-loop heartbeat with per-task
//!   failure isolation and monotonic due-time tracking
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`embedding`] — Pluggable text-to-vector embedding providers
//! - [`store`] — Read view over the canonical key-value records
//! - [`index`] — Write adapter for the derived vector index
//! - [`audit`] — Append-only reconciliation event log
//! - [`reconcile`] — Drift detection, correction planning, and execution
//! - [`heartbeat`] — Generic named-task cooperative scheduler

pub mod audit;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod heartbeat;
pub mod index;
pub mod reconcile;
pub mod store;
