//! Action Dispatcher and Query Executor.
//!
//! Every invocation routes through here: actions run inside one serialized
//! SQLite transaction, queries run on a read-only connection, and both leave
//! a line in the invocation log. This is the narrow waist that turns domain
//! failures into value-level error records while letting fatal failures
//! propagate untouched.

use crate::core::error::AtollError;
use crate::core::store::{Store, db_connect};
use crate::core::time;
use crate::core::value::Record;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// The single output record of an action: exactly one of a declared success
/// shape or `{error: <description>}`, never both, never neither.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Record),
    Error(String),
}

impl Outcome {
    /// Empty success record.
    pub fn ok() -> Self {
        Outcome::Success(Record::new())
    }

    pub fn success(record: Record) -> Self {
        Outcome::Success(record)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Outcome::Error(msg.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Wire shape: the success record's fields, or `{"error": ...}`. Absence
    /// of the `error` field is the sole success indicator for callers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Outcome::Success(rec) => rec.to_doc(),
            Outcome::Error(msg) => serde_json::json!({ "error": msg }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InvocationEvent {
    pub ts: String,
    pub event_id: String,
    pub concept: String,
    pub op: String,
    pub kind: String,
    pub status: String,
}

/// Execute one action invocation: `validating -> committed` on success,
/// `validating -> rejected` on a domain error (the transaction is rolled
/// back, so state is untouched even if the action body had already written —
/// this is also what makes multi-relation effects all-or-nothing). Fatal
/// failures roll back and propagate as `Err`. No retry, no idempotence
/// machinery: an action is idempotent only if its documented effect is.
pub fn run_action<F>(store: &Store, concept: &str, op: &str, f: F) -> Result<Outcome, AtollError>
where
    F: FnOnce(&Connection) -> Result<Outcome, AtollError>,
{
    // In-process serialization of mutations, one writer at a time.
    static DB_LOCK: Mutex<()> = Mutex::new(());
    let _lock = DB_LOCK.lock().unwrap();

    let conn = db_connect(&store.db_path())?;
    conn.execute_batch("BEGIN IMMEDIATE")?;

    let result = f(&conn);

    let status = match &result {
        Ok(outcome) if outcome.is_success() => {
            conn.execute_batch("COMMIT")?;
            "committed"
        }
        Ok(_) => {
            conn.execute_batch("ROLLBACK")?;
            "rejected"
        }
        Err(_) => {
            let _ = conn.execute_batch("ROLLBACK");
            "fatal"
        }
    };
    log_invocation(store, concept, op, "action", status)?;
    result
}

/// Execute one read-only projection. The connection is pinned to
/// `query_only` before the body runs: a query that attempts a write fails
/// fatally rather than mutating state. An empty result is not an error.
pub fn run_query<F>(
    store: &Store,
    concept: &str,
    op: &str,
    f: F,
) -> Result<Vec<Record>, AtollError>
where
    F: FnOnce(&Connection) -> Result<Vec<Record>, AtollError>,
{
    let conn = db_connect(&store.db_path())?;
    conn.pragma_update(None, "query_only", true)?;

    let result = f(&conn);

    let status = if result.is_ok() { "ok" } else { "fatal" };
    log_invocation(store, concept, op, "query", status)?;
    result
}

fn log_invocation(
    store: &Store,
    concept: &str,
    op: &str,
    kind: &str,
    status: &str,
) -> Result<(), AtollError> {
    use std::fs::OpenOptions;
    use std::io::Write;

    let ev = InvocationEvent {
        ts: time::now_epoch_z(),
        event_id: time::new_event_id(),
        concept: concept.to_string(),
        op: op.to_string(),
        kind: kind.to_string(),
        status: status.to_string(),
    };

    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(store.invocation_log_path())
        .map_err(AtollError::IoError)?;

    writeln!(f, "{}", serde_json::to_string(&ev).unwrap()).map_err(AtollError::IoError)?;
    Ok(())
}
