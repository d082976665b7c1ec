//! State Binder: realizes a concept's declared relations as collections.
//!
//! Each declared relation maps to exactly one SQLite table named
//! `{ConceptName}.{relationName}`. The concept-name prefix keeps collections
//! collision-free across concepts; the Isolation Checker forbids any concept
//! module from naming another concept's prefix. Documents are keyed by an
//! Identifier in the `_id` position and stored as decl-validated JSON.

use crate::core::error::AtollError;
use crate::core::id::Id;
use crate::core::store::{Store, db_connect};
use crate::core::value::{Record, RelationDecl, Value};
use rusqlite::{Connection, OptionalExtension, params};

/// A bound collection: the live handle a concept's actions and queries use
/// to reach one of its own relations. Held for the instance's lifetime.
#[derive(Debug, Clone)]
pub struct Binding {
    pub decl: RelationDecl,
    table: String,
}

/// Bind a concept's declared relations. Given N declarations, exactly N
/// collections exist afterwards; binding is idempotent across restarts.
pub fn bind(
    store: &Store,
    concept: &'static str,
    decls: &'static [RelationDecl],
) -> Result<Vec<Binding>, AtollError> {
    let conn = db_connect(&store.db_path())?;
    let mut bindings = Vec::with_capacity(decls.len());
    for decl in decls {
        let table = format!("{}.{}", concept, decl.name);
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (_id TEXT PRIMARY KEY, doc TEXT NOT NULL)",
                table
            ),
            [],
        )?;
        bindings.push(Binding { decl: *decl, table });
    }
    Ok(bindings)
}

impl Binding {
    /// Collection namespace, `{ConceptName}.{relationName}`.
    pub fn namespace(&self) -> &str {
        &self.table
    }

    pub fn get(&self, conn: &Connection, id: &Id) -> Result<Option<Record>, AtollError> {
        let doc: Option<String> = conn
            .query_row(
                &format!("SELECT doc FROM \"{}\" WHERE _id = ?1", self.table),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match doc {
            Some(raw) => {
                let json: serde_json::Value = serde_json::from_str(&raw)
                    .map_err(|e| AtollError::SchemaError(format!("corrupt document: {}", e)))?;
                Ok(Some(Record::from_doc(&self.decl, &json)?))
            }
            None => Ok(None),
        }
    }

    /// All documents matching `filter`, in insertion order. An empty filter
    /// matches everything; an empty result is not an error.
    pub fn find(&self, conn: &Connection, filter: &Record) -> Result<Vec<Record>, AtollError> {
        filter.validate_filter(&self.decl)?;
        // _id-only fast path: primary key lookup instead of a scan.
        if let Some(Value::Id(id)) = filter.get("_id") {
            let id = id.clone();
            return Ok(self
                .get(conn, &id)?
                .into_iter()
                .filter(|rec| rec.matches(filter))
                .collect());
        }
        let mut stmt = conn.prepare(&format!(
            "SELECT doc FROM \"{}\" ORDER BY rowid",
            self.table
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for raw in rows {
            let raw = raw?;
            let json: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| AtollError::SchemaError(format!("corrupt document: {}", e)))?;
            let rec = Record::from_doc(&self.decl, &json)?;
            if rec.matches(filter) {
                out.push(rec);
            }
        }
        Ok(out)
    }

    pub fn insert(&self, conn: &Connection, record: &Record) -> Result<(), AtollError> {
        record.validate_entity(&self.decl)?;
        let id = record.id().cloned().ok_or_else(|| {
            AtollError::SchemaError(format!("insert into '{}' without _id", self.table))
        })?;
        let doc = serde_json::to_string(&record.to_doc())
            .map_err(|e| AtollError::SchemaError(e.to_string()))?;
        conn.execute(
            &format!("INSERT INTO \"{}\" (_id, doc) VALUES (?1, ?2)", self.table),
            params![id, doc],
        )?;
        Ok(())
    }

    /// Replace the document keyed by `id`. The caller has already established
    /// existence through its precondition; a zero-row update here means an
    /// internal invariant broke.
    pub fn replace(&self, conn: &Connection, id: &Id, record: &Record) -> Result<(), AtollError> {
        record.validate_entity(&self.decl)?;
        let doc = serde_json::to_string(&record.to_doc())
            .map_err(|e| AtollError::SchemaError(e.to_string()))?;
        let changed = conn.execute(
            &format!("UPDATE \"{}\" SET doc = ?2 WHERE _id = ?1", self.table),
            params![id, doc],
        )?;
        if changed != 1 {
            return Err(AtollError::InvariantViolation(format!(
                "replace in '{}' touched {} rows for id {}",
                self.table, changed, id
            )));
        }
        Ok(())
    }

    /// Remove the document keyed by `id`. Only actions whose documented
    /// effect is deletion call this; documents never disappear implicitly.
    pub fn remove(&self, conn: &Connection, id: &Id) -> Result<(), AtollError> {
        let changed = conn.execute(
            &format!("DELETE FROM \"{}\" WHERE _id = ?1", self.table),
            params![id],
        )?;
        if changed != 1 {
            return Err(AtollError::InvariantViolation(format!(
                "remove from '{}' touched {} rows for id {}",
                self.table, changed, id
            )));
        }
        Ok(())
    }
}
