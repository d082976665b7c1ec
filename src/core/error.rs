use rusqlite;
use std::io;
use thiserror::Error;

/// Fatal failures only. Domain-level failures (precondition violations,
/// missing entities, conflicts) never appear here; they travel as
/// `Outcome::Error` records so callers branch on outcomes as plain data.
#[derive(Error, Debug)]
pub enum AtollError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to initialize store: {0}")]
    StoreInitializationError(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Unknown operation '{op}' on concept '{concept}'")]
    UnknownOperation { concept: String, op: String },
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}
