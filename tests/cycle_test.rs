mod helpers;

use helpers::{reconciler_config, test_db, test_embedding, OLD_TS};
use vexsync::audit::{count_events, EventKind};
use vexsync::embedding::HashEmbeddingProvider;
use vexsync::reconcile::cycle::run_cycle;
use vexsync::reconcile::detect::scan;
use vexsync::reconcile::types::{Mode, Ruleset};
use vexsync::{index, store};

#[test]
fn full_cycle_in_apply_mode_clears_all_drift() {
    let mut conn = test_db();
    store::put_record(&conn, "missing", "brand new", false).unwrap();
    store::put_record(&conn, "stale", "updated since embed", false).unwrap();
    index::upsert(&mut conn, "stale", &test_embedding(1), OLD_TS).unwrap();
    index::upsert(&mut conn, "orphan", &test_embedding(2), OLD_TS).unwrap();

    let cfg = reconciler_config(Mode::Apply, Ruleset::Strict);
    let report = run_cycle(&mut conn, &HashEmbeddingProvider, &cfg).unwrap();

    assert_eq!(report.findings, 3);
    assert_eq!(report.missing, 1);
    assert_eq!(report.stale, 1);
    assert_eq!(report.orphaned, 1);
    assert_eq!(report.applied, 3);
    assert!(report.clean());

    assert!(index::exists(&conn, "missing").unwrap());
    assert!(index::exists(&conn, "stale").unwrap());
    assert!(!index::exists(&conn, "orphan").unwrap());
    assert!(scan(&conn, Ruleset::Strict).unwrap().is_empty());
}

#[test]
fn every_finding_gets_exactly_one_detection_and_one_outcome_event() {
    let mut conn = test_db();
    store::put_record(&conn, "a", "1", false).unwrap();
    store::put_record(&conn, "b", "2", false).unwrap();
    index::upsert(&mut conn, "c", &test_embedding(1), OLD_TS).unwrap();

    let cfg = reconciler_config(Mode::Apply, Ruleset::Lenient);
    run_cycle(&mut conn, &HashEmbeddingProvider, &cfg).unwrap();

    assert_eq!(count_events(&conn, EventKind::DriftDetected).unwrap(), 3);
    assert_eq!(count_events(&conn, EventKind::CorrectionApplied).unwrap(), 3);
    assert_eq!(count_events(&conn, EventKind::CorrectionProposed).unwrap(), 0);
    assert_eq!(count_events(&conn, EventKind::TaskError).unwrap(), 0);
}

#[test]
fn propose_mode_leaves_an_audit_trail_but_no_index_changes() {
    let mut conn = test_db();
    store::put_record(&conn, "pending", "not yet indexed", false).unwrap();

    let cfg = reconciler_config(Mode::Propose, Ruleset::Lenient);
    let report = run_cycle(&mut conn, &HashEmbeddingProvider, &cfg).unwrap();

    assert_eq!(report.proposed, 1);
    assert_eq!(report.applied, 0);
    assert_eq!(index::count(&conn).unwrap(), 0);
    assert_eq!(count_events(&conn, EventKind::DriftDetected).unwrap(), 1);
    assert_eq!(count_events(&conn, EventKind::CorrectionProposed).unwrap(), 1);
}

#[test]
fn audit_payloads_never_contain_record_values() {
    let mut conn = test_db();
    let secret_value = "hunter2-super-secret";
    store::put_record(&conn, "credential_name", secret_value, false).unwrap();
    store::put_record(&conn, "note", "only-the-reconciler-knows", false).unwrap();
    index::upsert(&mut conn, "note", &test_embedding(1), OLD_TS).unwrap();

    let cfg = reconciler_config(Mode::Apply, Ruleset::Strict);
    run_cycle(&mut conn, &HashEmbeddingProvider, &cfg).unwrap();

    let all_payloads: String = conn
        .prepare("SELECT COALESCE(payload, '') FROM reconcile_log")
        .unwrap()
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
        .join("\n");

    assert!(!all_payloads.is_empty());
    assert!(!all_payloads.contains(secret_value));
    assert!(!all_payloads.contains("only-the-reconciler-knows"));
    // Keys are fine to log
    assert!(all_payloads.contains("credential_name"));
}

#[test]
fn drift_introduced_between_cycles_is_caught_next_time() {
    let mut conn = test_db();
    let cfg = reconciler_config(Mode::Apply, Ruleset::Lenient);

    store::put_record(&conn, "first", "one", false).unwrap();
    let report = run_cycle(&mut conn, &HashEmbeddingProvider, &cfg).unwrap();
    assert_eq!(report.applied, 1);

    // A concurrent writer updates the record after the cycle
    store::put_record(&conn, "first", "one, revised", false).unwrap();

    let report = run_cycle(&mut conn, &HashEmbeddingProvider, &cfg).unwrap();
    assert_eq!(report.stale, 1);
    assert_eq!(report.applied, 1);
    assert!(scan(&conn, Ruleset::Lenient).unwrap().is_empty());
}
