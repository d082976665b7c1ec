//! The Concept contract.
//!
//! A concept is an independently implementable unit: a name, a purpose, one
//! or more state relations, and a closed set of actions and queries. The
//! operation surface is enumerable — `actions()` and `queries()` list every
//! name `act`/`query` will accept — so an external coordinator can drive a
//! concept purely by name and Identifier values, and the Isolation Checker
//! can verify the full surface statically. Query names start with `_` to
//! mark them read-only.

use crate::core::dispatch::Outcome;
use crate::core::error::AtollError;
use crate::core::value::{Record, RelationDecl};

pub trait Concept {
    fn name(&self) -> &'static str;
    fn purpose(&self) -> &'static str;
    fn relations(&self) -> &'static [RelationDecl];
    fn actions(&self) -> &'static [&'static str];
    fn queries(&self) -> &'static [&'static str];

    /// Invoke one action by name. A name outside `actions()` is a caller
    /// programming defect and fails fatally; everything the caller can get
    /// wrong about the *input record* comes back as an error `Outcome`.
    fn act(&self, op: &str, input: &Record) -> Result<Outcome, AtollError>;

    /// Invoke one query by name. Never mutates state.
    fn query(&self, op: &str, filter: &Record) -> Result<Vec<Record>, AtollError>;
}

/// The fatal error for an operation name outside the concept's declared set.
pub fn unknown_operation(concept: &str, op: &str) -> AtollError {
    AtollError::UnknownOperation {
        concept: concept.to_string(),
        op: op.to_string(),
    }
}

/// Machine-readable description of a concept's full surface: relations with
/// their attribute declarations, plus every action and query name.
pub fn describe(concept: &dyn Concept) -> serde_json::Value {
    use crate::core::value::{AttrKind, Card};
    let relations: Vec<serde_json::Value> = concept
        .relations()
        .iter()
        .map(|rel| {
            let attrs: Vec<serde_json::Value> = rel
                .attrs
                .iter()
                .map(|a| {
                    serde_json::json!({
                        "name": a.name,
                        "kind": match a.kind {
                            AttrKind::Bool => "bool",
                            AttrKind::Int => "int",
                            AttrKind::Float => "float",
                            AttrKind::Str => "string",
                            AttrKind::Id => "id",
                        },
                        "card": match a.card {
                            Card::One => "one",
                            Card::Set => "set",
                            Card::List => "list",
                        },
                    })
                })
                .collect();
            serde_json::json!({
                "name": rel.name,
                "namespace": format!("{}.{}", concept.name(), rel.name),
                "attrs": attrs,
            })
        })
        .collect();
    serde_json::json!({
        "name": concept.name(),
        "purpose": concept.purpose(),
        "relations": relations,
        "actions": concept.actions(),
        "queries": concept.queries(),
    })
}
