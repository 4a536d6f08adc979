//! Correction planning — one finding, one reversible plan.
//!
//! The planner records intent, it never performs it: no embedding happens
//! here, and the index is only read (to snapshot the entry an update or
//! removal will displace, so the executor can later revert).

use rusqlite::Connection;

use crate::error::ReconcileError;
use crate::index;
use crate::reconcile::types::{
    ActionKind, CorrectionAction, CorrectionPlan, DriftFinding, DriftKind,
};

/// Build the correction plan for one finding.
///
/// `missing_vector` → add, `stale_vector` → update, `orphaned_vector` →
/// remove. For update and remove, the current index entry is snapshotted
/// into the action metadata; without that snapshot a later revert reports
/// `NotReversible` instead of guessing.
pub fn build_plan(
    conn: &Connection,
    finding: &DriftFinding,
) -> Result<CorrectionPlan, ReconcileError> {
    let key = &finding.key;

    let (action, preview) = match finding.kind {
        DriftKind::MissingVector => {
            let action = CorrectionAction {
                kind: ActionKind::AddVector,
                key: key.clone(),
                metadata: serde_json::json!({}),
            };
            (action, format!("add vector for key '{key}'"))
        }
        DriftKind::StaleVector => {
            let prior = snapshot_metadata(conn, key)?;
            let preview = match prior_indexed_at(&prior) {
                Some(ts) => {
                    format!("re-embed key '{key}' (replacing entry indexed at {ts})")
                }
                None => format!("re-embed key '{key}' (prior entry not snapshotted)"),
            };
            let action = CorrectionAction {
                kind: ActionKind::UpdateVector,
                key: key.clone(),
                metadata: prior,
            };
            (action, preview)
        }
        DriftKind::OrphanedVector => {
            let prior = snapshot_metadata(conn, key)?;
            let preview = match prior_indexed_at(&prior) {
                Some(ts) => {
                    format!("remove index entry for key '{key}' (indexed at {ts})")
                }
                None => format!("remove index entry for key '{key}'"),
            };
            let action = CorrectionAction {
                kind: ActionKind::RemoveVector,
                key: key.clone(),
                metadata: prior,
            };
            (action, preview)
        }
    };

    Ok(CorrectionPlan {
        id: uuid::Uuid::now_v7().to_string(),
        finding_id: finding.id.clone(),
        actions: vec![action],
        preview,
    })
}

/// Snapshot the current index entry into action metadata, if one exists.
fn snapshot_metadata(conn: &Connection, key: &str) -> Result<serde_json::Value, ReconcileError> {
    match index::snapshot(conn, key).map_err(ReconcileError::read)? {
        Some((embedding, indexed_at)) => Ok(serde_json::json!({
            "prior": { "embedding": embedding, "indexed_at": indexed_at }
        })),
        None => Ok(serde_json::json!({})),
    }
}

fn prior_indexed_at(metadata: &serde_json::Value) -> Option<&str> {
    metadata["prior"]["indexed_at"].as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::detect;
    use crate::reconcile::types::Ruleset;
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

    fn single_finding(conn: &Connection) -> DriftFinding {
        let findings = detect::scan(conn, Ruleset::Strict).unwrap();
        assert_eq!(findings.len(), 1);
        findings.into_iter().next().unwrap()
    }

    #[test]
    fn missing_maps_to_add_action() {
        let conn = test_db();
        store::put_record(&conn, "greeting", "hello", false).unwrap();

        let finding = single_finding(&conn);
        let plan = build_plan(&conn, &finding).unwrap();

        assert_eq!(plan.finding_id, finding.id);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind, ActionKind::AddVector);
        assert_eq!(plan.actions[0].key, "greeting");
        assert!(plan.preview.contains("greeting"));
    }

    #[test]
    fn stale_maps_to_update_with_snapshot() {
        let mut conn = test_db();
        store::put_record(&conn, "mood", "curious", false).unwrap();
        index::upsert(&mut conn, "mood", &test_embedding(4), "2020-01-01T00:00:00+00:00")
            .unwrap();

        let finding = single_finding(&conn);
        let plan = build_plan(&conn, &finding).unwrap();

        let action = &plan.actions[0];
        assert_eq!(action.kind, ActionKind::UpdateVector);
        let prior = &action.metadata["prior"];
        assert_eq!(prior["indexed_at"], "2020-01-01T00:00:00+00:00");
        assert_eq!(prior["embedding"].as_array().unwrap().len(), 384);
        assert!(plan.preview.contains("2020-01-01T00:00:00+00:00"));
    }

    #[test]
    fn orphaned_maps_to_remove_with_snapshot() {
        let mut conn = test_db();
        index::upsert(
            &mut conn,
            "never_existed",
            &test_embedding(9),
            "2026-01-01T00:00:00+00:00",
        )
        .unwrap();

        let finding = single_finding(&conn);
        let plan = build_plan(&conn, &finding).unwrap();

        let action = &plan.actions[0];
        assert_eq!(action.kind, ActionKind::RemoveVector);
        assert!(action.metadata["prior"]["embedding"].is_array());
    }

    #[test]
    fn preview_never_contains_record_value() {
        let conn = test_db();
        store::put_record(&conn, "api_key_name", "hunter2-super-secret-value", false).unwrap();

        let finding = single_finding(&conn);
        let plan = build_plan(&conn, &finding).unwrap();
        assert!(!plan.preview.contains("hunter2"));
    }

    #[test]
    fn plans_get_fresh_ids() {
        let conn = test_db();
        store::put_record(&conn, "k", "v", false).unwrap();
        let finding = single_finding(&conn);

        let a = build_plan(&conn, &finding).unwrap();
        let b = build_plan(&conn, &finding).unwrap();
        assert_ne!(a.id, b.id);
    }
}
