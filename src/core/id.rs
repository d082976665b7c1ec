//! Identifier generation for concept state.
//!
//! Every entity in a concept's state relations is keyed by an `Id`: an
//! opaque, globally unique token. Ids are ULIDs under the hood, but callers
//! must treat them as meaningless strings; no ordering or structure is part
//! of the contract. Once issued, an Id is never reused.

use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// An opaque entity identifier. Not interchangeable with arbitrary strings:
/// normal code obtains one only from [`Id::fresh`], or carries one received
/// from another concept's action/query output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Allocate a fresh identifier. Never returns a previously issued value.
    pub fn fresh() -> Self {
        Id(Ulid::new().to_string())
    }

    /// Unchecked conversion from a raw string. For test fixtures and
    /// boundary parsing (CLI arguments, audit replay) only.
    pub fn unchecked(raw: &str) -> Self {
        Id(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToSql for Id {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for Id {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Id)
    }
}
