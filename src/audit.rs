//! Append-only reconciliation audit sink.
//!
//! Every finding, every plan (in every mode), every execution attempt and
//! every reversal attempt produces exactly one row in `reconcile_log`.
//! Payloads are privacy-filtered: keys, action kinds, timestamps and
//! diagnostics only — never canonical record values. The engine only ever
//! appends; the `log` CLI command and external tooling are the readers.

use rusqlite::{params, Connection};
use serde::Serialize;

/// The five reconciliation event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DriftDetected,
    CorrectionProposed,
    CorrectionApplied,
    CorrectionReverted,
    TaskError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DriftDetected => "drift_detected",
            Self::CorrectionProposed => "correction_proposed",
            Self::CorrectionApplied => "correction_applied",
            Self::CorrectionReverted => "correction_reverted",
            Self::TaskError => "task_error",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row read back from `reconcile_log` (for the `log` CLI command and
/// operational tooling — the engine itself never reads its own output).
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub id: i64,
    pub event_type: String,
    pub payload: Option<serde_json::Value>,
    pub created_at: String,
}

/// Append one event. Accepts a `Transaction` as well via deref.
pub fn append_event(
    conn: &Connection,
    kind: EventKind,
    payload: &serde_json::Value,
) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO reconcile_log (event_type, payload, created_at) VALUES (?1, ?2, ?3)",
        params![kind.as_str(), payload.to_string(), now],
    )?;
    Ok(())
}

/// Most recent events, newest first.
pub fn recent_events(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<AuditEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, payload, created_at FROM reconcile_log \
         ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            let payload_str: Option<String> = row.get(2)?;
            Ok(AuditEvent {
                id: row.get(0)?,
                event_type: row.get(1)?,
                payload: payload_str.and_then(|s| serde_json::from_str(&s).ok()),
                created_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Count events of one type (test and stats helper).
pub fn count_events(conn: &Connection, kind: EventKind) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM reconcile_log WHERE event_type = ?1",
        params![kind.as_str()],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn append_and_read_back() {
        let conn = test_db();
        append_event(
            &conn,
            EventKind::DriftDetected,
            &serde_json::json!({"key": "greeting", "kind": "missing_vector"}),
        )
        .unwrap();

        let events = recent_events(&conn, 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "drift_detected");
        assert_eq!(
            events[0].payload.as_ref().unwrap()["key"],
            serde_json::json!("greeting")
        );
    }

    #[test]
    fn recent_events_newest_first_and_limited() {
        let conn = test_db();
        for i in 0..5 {
            append_event(
                &conn,
                EventKind::TaskError,
                &serde_json::json!({"seq": i}),
            )
            .unwrap();
        }

        let events = recent_events(&conn, 3).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].payload.as_ref().unwrap()["seq"], 4);
        assert_eq!(events[2].payload.as_ref().unwrap()["seq"], 2);
    }

    #[test]
    fn count_events_filters_by_kind() {
        let conn = test_db();
        append_event(&conn, EventKind::CorrectionApplied, &serde_json::json!({})).unwrap();
        append_event(&conn, EventKind::CorrectionApplied, &serde_json::json!({})).unwrap();
        append_event(&conn, EventKind::TaskError, &serde_json::json!({})).unwrap();

        assert_eq!(count_events(&conn, EventKind::CorrectionApplied).unwrap(), 2);
        assert_eq!(count_events(&conn, EventKind::TaskError).unwrap(), 1);
        assert_eq!(count_events(&conn, EventKind::CorrectionReverted).unwrap(), 0);
    }
}
