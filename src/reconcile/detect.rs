//! Drift detection — three rules evaluated in one streaming pass.
//!
//! Detection reads the canonical store and the index and computes; it never
//! writes. Findings are emitted in key order within each rule (missing, then
//! stale, then orphaned), which fixes the processing order for the rest of
//! the cycle.

use rusqlite::Connection;

use crate::error::ReconcileError;
use crate::reconcile::types::{DriftFinding, DriftKind, Ruleset, Severity};

/// Severity assignment is a pure function of `(kind, ruleset)` and nothing
/// else. Strict: everything is high. Lenient: missing/stale are medium,
/// orphaned is low.
pub fn severity_for(kind: DriftKind, ruleset: Ruleset) -> Severity {
    match ruleset {
        Ruleset::Strict => Severity::High,
        Ruleset::Lenient => match kind {
            DriftKind::MissingVector | DriftKind::StaleVector => Severity::Medium,
            DriftKind::OrphanedVector => Severity::Low,
        },
    }
}

/// Scan the canonical store and the index for drift.
///
/// Sensitive records are excluded from the missing and stale rules — they
/// must never be surfaced by the index. An index entry that exists for a
/// sensitive key is orphaned (it should never have existed), exactly like
/// entries for tombstoned or absent keys.
///
/// Adapter read failures abort the scan; the caller skips this cycle and the
/// next heartbeat tick retries.
pub fn scan(conn: &Connection, ruleset: Ruleset) -> Result<Vec<DriftFinding>, ReconcileError> {
    let mut findings = Vec::new();

    // Rule 1: live, non-sensitive record with no index entry.
    let mut stmt = conn
        .prepare(
            "SELECT r.key, r.updated_at FROM records r \
             WHERE r.sensitive = 0 AND r.value <> '' \
               AND NOT EXISTS (SELECT 1 FROM vec_meta v WHERE v.key = r.key) \
             ORDER BY r.key",
        )
        .map_err(ReconcileError::read)?;
    let missing = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(ReconcileError::read)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(ReconcileError::read)?;
    for (key, updated_at) in missing {
        findings.push(new_finding(
            DriftKind::MissingVector,
            ruleset,
            key,
            serde_json::json!({ "record_updated_at": updated_at }),
        ));
    }

    // Rule 2: both sides exist and the record changed after its last
    // embedding. Any positive delta counts; RFC 3339 UTC strings compare
    // lexicographically.
    let mut stmt = conn
        .prepare(
            "SELECT r.key, r.updated_at, v.indexed_at \
             FROM records r JOIN vec_meta v ON v.key = r.key \
             WHERE r.sensitive = 0 AND r.value <> '' AND r.updated_at > v.indexed_at \
             ORDER BY r.key",
        )
        .map_err(ReconcileError::read)?;
    let stale = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(ReconcileError::read)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(ReconcileError::read)?;
    for (key, updated_at, indexed_at) in stale {
        findings.push(new_finding(
            DriftKind::StaleVector,
            ruleset,
            key,
            serde_json::json!({
                "record_updated_at": updated_at,
                "indexed_at": indexed_at,
            }),
        ));
    }

    // Rule 3: index entry whose record is tombstoned, absent, or sensitive.
    let mut stmt = conn
        .prepare(
            "SELECT v.key, v.indexed_at, \
                    CASE WHEN r.key IS NULL THEN 'absent' \
                         WHEN r.sensitive = 1 THEN 'sensitive' \
                         ELSE 'tombstoned' END AS cause \
             FROM vec_meta v LEFT JOIN records r ON r.key = v.key \
             WHERE r.key IS NULL OR r.value = '' OR r.sensitive = 1 \
             ORDER BY v.key",
        )
        .map_err(ReconcileError::read)?;
    let orphaned = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(ReconcileError::read)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(ReconcileError::read)?;
    for (key, indexed_at, cause) in orphaned {
        findings.push(new_finding(
            DriftKind::OrphanedVector,
            ruleset,
            key,
            serde_json::json!({ "indexed_at": indexed_at, "cause": cause }),
        ));
    }

    Ok(findings)
}

fn new_finding(
    kind: DriftKind,
    ruleset: Ruleset,
    key: String,
    details: serde_json::Value,
) -> DriftFinding {
    DriftFinding {
        id: uuid::Uuid::now_v7().to_string(),
        kind,
        severity: severity_for(kind, ruleset),
        key,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{index, store};

    fn test_db() -> Connection {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    fn test_embedding(seed: u8) -> Vec<f32> {
        let mut v = vec![0.0f32; 384];
        v[seed as usize % 384] = 1.0;
        v
    }

    #[test]
    fn severity_mapping_is_pure() {
        for kind in [
            DriftKind::MissingVector,
            DriftKind::StaleVector,
            DriftKind::OrphanedVector,
        ] {
            assert_eq!(severity_for(kind, Ruleset::Strict), Severity::High);
        }
        assert_eq!(
            severity_for(DriftKind::MissingVector, Ruleset::Lenient),
            Severity::Medium
        );
        assert_eq!(
            severity_for(DriftKind::StaleVector, Ruleset::Lenient),
            Severity::Medium
        );
        assert_eq!(
            severity_for(DriftKind::OrphanedVector, Ruleset::Lenient),
            Severity::Low
        );
    }

    #[test]
    fn clean_store_has_no_findings() {
        let conn = test_db();
        assert!(scan(&conn, Ruleset::Strict).unwrap().is_empty());
    }

    #[test]
    fn missing_vector_detected() {
        let conn = test_db();
        store::put_record(&conn, "greeting", "hello", false).unwrap();

        let findings = scan(&conn, Ruleset::Strict).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, DriftKind::MissingVector);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].key, "greeting");
    }

    #[test]
    fn stale_vector_detected_on_any_positive_delta() {
        let mut conn = test_db();
        store::put_record(&conn, "mood", "curious", false).unwrap();
        // Index entry stamped before the record write
        index::upsert(&mut conn, "mood", &test_embedding(1), "2020-01-01T00:00:00+00:00")
            .unwrap();

        let findings = scan(&conn, Ruleset::Lenient).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, DriftKind::StaleVector);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].key, "mood");
    }

    #[test]
    fn up_to_date_entry_is_not_stale() {
        let mut conn = test_db();
        store::put_record(&conn, "mood", "curious", false).unwrap();
        let far_future = "2999-01-01T00:00:00+00:00";
        index::upsert(&mut conn, "mood", &test_embedding(1), far_future).unwrap();

        assert!(scan(&conn, Ruleset::Strict).unwrap().is_empty());
    }

    #[test]
    fn orphaned_vector_detected_for_tombstone_absent_and_sensitive() {
        let mut conn = test_db();
        let ts = "2999-01-01T00:00:00+00:00";

        store::put_record(&conn, "deleted_note", "text", false).unwrap();
        index::upsert(&mut conn, "deleted_note", &test_embedding(1), ts).unwrap();
        store::tombstone_record(&conn, "deleted_note").unwrap();

        index::upsert(&mut conn, "never_existed", &test_embedding(2), ts).unwrap();

        store::put_record(&conn, "secret", "classified", true).unwrap();
        index::upsert(&mut conn, "secret", &test_embedding(3), ts).unwrap();

        let findings = scan(&conn, Ruleset::Lenient).unwrap();
        assert_eq!(findings.len(), 3);
        assert!(findings
            .iter()
            .all(|f| f.kind == DriftKind::OrphanedVector && f.severity == Severity::Low));

        let cause_of = |key: &str| {
            findings
                .iter()
                .find(|f| f.key == key)
                .unwrap()
                .details["cause"]
                .as_str()
                .unwrap()
                .to_string()
        };
        assert_eq!(cause_of("deleted_note"), "tombstoned");
        assert_eq!(cause_of("never_existed"), "absent");
        assert_eq!(cause_of("secret"), "sensitive");
    }

    #[test]
    fn sensitive_records_excluded_from_missing_and_stale() {
        let mut conn = test_db();
        // Sensitive, unindexed: no missing_vector finding
        store::put_record(&conn, "secret", "classified", true).unwrap();
        assert!(scan(&conn, Ruleset::Strict).unwrap().is_empty());

        // Sensitive with a stale-looking entry: orphaned, never stale
        index::upsert(&mut conn, "secret", &test_embedding(1), "2020-01-01T00:00:00+00:00")
            .unwrap();
        let findings = scan(&conn, Ruleset::Strict).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, DriftKind::OrphanedVector);
    }

    #[test]
    fn tombstone_without_entry_is_clean() {
        let conn = test_db();
        store::put_record(&conn, "gone", "was here", false).unwrap();
        store::tombstone_record(&conn, "gone").unwrap();

        assert!(scan(&conn, Ruleset::Strict).unwrap().is_empty());
    }

    #[test]
    fn scan_is_idempotent() {
        let mut conn = test_db();
        store::put_record(&conn, "a", "1", false).unwrap();
        store::put_record(&conn, "b", "2", false).unwrap();
        index::upsert(&mut conn, "b", &test_embedding(1), "2020-01-01T00:00:00+00:00")
            .unwrap();
        index::upsert(&mut conn, "z", &test_embedding(2), "2020-01-01T00:00:00+00:00")
            .unwrap();

        let first = scan(&conn, Ruleset::Lenient).unwrap();
        let second = scan(&conn, Ruleset::Lenient).unwrap();

        let shape = |fs: &[DriftFinding]| {
            fs.iter()
                .map(|f| (f.key.clone(), f.kind, f.severity))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&first), shape(&second));
        assert_eq!(first.len(), 3); // missing a, stale b, orphaned z
    }

    #[test]
    fn findings_are_key_ordered_within_each_rule() {
        let conn = test_db();
        store::put_record(&conn, "zebra", "z", false).unwrap();
        store::put_record(&conn, "apple", "a", false).unwrap();

        let findings = scan(&conn, Ruleset::Strict).unwrap();
        let keys: Vec<&str> = findings.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["apple", "zebra"]);
    }
}
