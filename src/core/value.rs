//! The value universe for concept state.
//!
//! Attributes of a state relation are restricted to primitives, Identifiers,
//! or ordered/unordered collections of these. Nothing richer is storable:
//! there is deliberately no map/object variant, and the decl-driven JSON
//! codec rejects one on the way in. Cross-concept references therefore can
//! only ever be carried as opaque [`Id`] values.

use crate::core::error::AtollError;
use crate::core::id::Id;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Id(Id),
    /// Collection of scalars. Whether it is treated as ordered (List) or
    /// unordered duplicate-free (Set) is decided by the attribute declaration.
    List(Vec<Value>),
}

impl Value {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Id(_) => "id",
            Value::List(_) => "list",
        }
    }
}

/// Scalar kind of a declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Bool,
    Int,
    Float,
    Str,
    Id,
}

/// Cardinality of a declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Card {
    /// Exactly one scalar.
    One,
    /// Unordered, duplicate-free collection of scalars.
    Set,
    /// Ordered collection of scalars.
    List,
}

#[derive(Debug, Clone, Copy)]
pub struct AttrDecl {
    pub name: &'static str,
    pub kind: AttrKind,
    pub card: Card,
}

/// One declared state relation: a named collection of entities, each keyed
/// by an `_id` Identifier with the declared attributes.
#[derive(Debug, Clone, Copy)]
pub struct RelationDecl {
    pub name: &'static str,
    pub attrs: &'static [AttrDecl],
}

impl RelationDecl {
    pub fn attr(&self, name: &str) -> Option<&AttrDecl> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

/// A record: named fields over the restricted value universe. Field order is
/// canonical (sorted by name) so that two equal records serialize identically.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Record(BTreeMap::new())
    }

    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.0.insert(field.to_string(), value);
        self
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The `_id` key of an entity record.
    pub fn id(&self) -> Option<&Id> {
        match self.0.get("_id") {
            Some(Value::Id(id)) => Some(id),
            _ => None,
        }
    }

    /// Exact-shape check for action inputs: the input must carry exactly the
    /// declared parameter fields. Extra or missing fields are a usage error,
    /// reported as a domain message (the caller gets an error record).
    pub fn expect_shape(&self, fields: &[&str]) -> Result<(), String> {
        for f in fields {
            if !self.0.contains_key(*f) {
                return Err(format!("missing field: {}", f));
            }
        }
        for k in self.0.keys() {
            if !fields.contains(&k.as_str()) {
                return Err(format!("unexpected field: {}", k));
            }
        }
        Ok(())
    }

    pub fn require_str(&self, field: &str) -> Result<&str, String> {
        match self.0.get(field) {
            Some(Value::Str(s)) => Ok(s),
            Some(v) => Err(format!("field '{}' must be a string, got {}", field, v.kind_name())),
            None => Err(format!("missing field: {}", field)),
        }
    }

    pub fn require_id(&self, field: &str) -> Result<&Id, String> {
        match self.0.get(field) {
            Some(Value::Id(id)) => Ok(id),
            Some(v) => Err(format!("field '{}' must be an id, got {}", field, v.kind_name())),
            None => Err(format!("missing field: {}", field)),
        }
    }

    /// Subset match used by query filters. Scalar against scalar is equality;
    /// a scalar filter value against a Set/List attribute means containment;
    /// list against list is positional equality.
    pub fn matches(&self, filter: &Record) -> bool {
        filter.0.iter().all(|(k, wanted)| match self.0.get(k) {
            Some(actual) => value_matches(actual, wanted),
            None => false,
        })
    }

    /// Validate an entity record against its relation declaration: `_id`
    /// present and Id-typed, every declared attribute present with the right
    /// kind and cardinality, nothing undeclared, no nesting. Failures here
    /// are programming defects in the owning concept, hence fatal.
    pub fn validate_entity(&self, decl: &RelationDecl) -> Result<(), AtollError> {
        if self.id().is_none() {
            return Err(AtollError::SchemaError(format!(
                "entity for relation '{}' lacks an Id-typed _id",
                decl.name
            )));
        }
        for attr in decl.attrs {
            let value = self.0.get(attr.name).ok_or_else(|| {
                AtollError::SchemaError(format!(
                    "entity for relation '{}' missing attribute '{}'",
                    decl.name, attr.name
                ))
            })?;
            check_attr_value(decl.name, attr, value)?;
        }
        for k in self.0.keys() {
            if k != "_id" && decl.attr(k).is_none() {
                return Err(AtollError::SchemaError(format!(
                    "entity for relation '{}' carries undeclared attribute '{}'",
                    decl.name, k
                )));
            }
        }
        Ok(())
    }

    /// Validate a query filter: fields must be a subset of `_id` plus the
    /// declared attributes. An unknown filter field is a usage defect.
    pub fn validate_filter(&self, decl: &RelationDecl) -> Result<(), AtollError> {
        for k in self.0.keys() {
            if k != "_id" && decl.attr(k).is_none() {
                return Err(AtollError::SchemaError(format!(
                    "filter field '{}' is not an attribute of relation '{}'",
                    k, decl.name
                )));
            }
        }
        Ok(())
    }

    /// Encode to the stored JSON document.
    pub fn to_doc(&self) -> JsonValue {
        let mut obj = serde_json::Map::new();
        for (k, v) in &self.0 {
            obj.insert(k.clone(), value_to_json(v));
        }
        JsonValue::Object(obj)
    }

    /// Decode a stored JSON document, using the declaration to restore Id
    /// typing (Ids serialize as plain strings and would otherwise decay).
    pub fn from_doc(decl: &RelationDecl, doc: &JsonValue) -> Result<Record, AtollError> {
        let obj = doc.as_object().ok_or_else(|| {
            AtollError::SchemaError(format!("document in '{}' is not an object", decl.name))
        })?;
        let mut rec = Record::new();
        for (k, v) in obj {
            let value = if k == "_id" {
                let raw = v.as_str().ok_or_else(|| {
                    AtollError::SchemaError(format!("non-string _id in '{}'", decl.name))
                })?;
                Value::Id(Id::unchecked(raw))
            } else {
                let attr = decl.attr(k).ok_or_else(|| {
                    AtollError::SchemaError(format!(
                        "stored document in '{}' carries undeclared attribute '{}'",
                        decl.name, k
                    ))
                })?;
                json_to_value(decl.name, attr, v)?
            };
            rec.set(k, value);
        }
        Ok(rec)
    }
}

fn value_matches(actual: &Value, wanted: &Value) -> bool {
    match (actual, wanted) {
        (Value::List(members), w) if w.is_scalar() => members.iter().any(|m| m == w),
        (a, w) => a == w,
    }
}

fn check_scalar(relation: &str, attr: &AttrDecl, value: &Value) -> Result<(), AtollError> {
    let ok = matches!(
        (attr.kind, value),
        (AttrKind::Bool, Value::Bool(_))
            | (AttrKind::Int, Value::Int(_))
            | (AttrKind::Float, Value::Float(_))
            | (AttrKind::Str, Value::Str(_))
            | (AttrKind::Id, Value::Id(_))
    );
    if ok {
        Ok(())
    } else {
        Err(AtollError::SchemaError(format!(
            "relation '{}' attribute '{}' has kind {:?}, got {}",
            relation,
            attr.name,
            attr.kind,
            value.kind_name()
        )))
    }
}

fn check_attr_value(relation: &str, attr: &AttrDecl, value: &Value) -> Result<(), AtollError> {
    match (attr.card, value) {
        (Card::One, v) if v.is_scalar() => check_scalar(relation, attr, v),
        (Card::One, _) => Err(AtollError::SchemaError(format!(
            "relation '{}' attribute '{}' is single-valued, got a list",
            relation, attr.name
        ))),
        (Card::Set, Value::List(members)) | (Card::List, Value::List(members)) => {
            for m in members {
                if !m.is_scalar() {
                    return Err(AtollError::SchemaError(format!(
                        "relation '{}' attribute '{}': nested collections are not storable",
                        relation, attr.name
                    )));
                }
                check_scalar(relation, attr, m)?;
            }
            if attr.card == Card::Set {
                for (i, m) in members.iter().enumerate() {
                    if members[..i].contains(m) {
                        return Err(AtollError::SchemaError(format!(
                            "relation '{}' attribute '{}' is a set but holds duplicates",
                            relation, attr.name
                        )));
                    }
                }
            }
            Ok(())
        }
        (Card::Set, _) | (Card::List, _) => Err(AtollError::SchemaError(format!(
            "relation '{}' attribute '{}' is a collection, got a scalar",
            relation, attr.name
        ))),
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(f) => JsonValue::from(*f),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Id(id) => JsonValue::String(id.to_string()),
        Value::List(members) => JsonValue::Array(members.iter().map(value_to_json).collect()),
    }
}

fn json_to_value(relation: &str, attr: &AttrDecl, json: &JsonValue) -> Result<Value, AtollError> {
    let scalar = |j: &JsonValue| -> Result<Value, AtollError> {
        let out = match (attr.kind, j) {
            (AttrKind::Bool, JsonValue::Bool(b)) => Some(Value::Bool(*b)),
            (AttrKind::Int, JsonValue::Number(n)) => n.as_i64().map(Value::Int),
            (AttrKind::Float, JsonValue::Number(n)) => n.as_f64().map(Value::Float),
            (AttrKind::Str, JsonValue::String(s)) => Some(Value::Str(s.clone())),
            (AttrKind::Id, JsonValue::String(s)) => Some(Value::Id(Id::unchecked(s))),
            _ => None,
        };
        out.ok_or_else(|| {
            AtollError::SchemaError(format!(
                "relation '{}' attribute '{}': stored value does not match kind {:?}",
                relation, attr.name, attr.kind
            ))
        })
    };
    match (attr.card, json) {
        (Card::One, j) => scalar(j),
        (Card::Set, JsonValue::Array(items)) | (Card::List, JsonValue::Array(items)) => {
            let members = items.iter().map(scalar).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(members))
        }
        _ => Err(AtollError::SchemaError(format!(
            "relation '{}' attribute '{}': stored value does not match cardinality {:?}",
            relation, attr.name, attr.card
        ))),
    }
}
