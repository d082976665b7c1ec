//! Labeling concept: attach named labels to items.
//!
//! Principle: after a label is created and added to an item, querying that
//! item shows the label, and querying by label finds the item. Items are
//! foreign entities — this concept knows them only as opaque Identifiers and
//! stores nothing about them beyond their label sets.

use crate::core::binder::{self, Binding};
use crate::core::concept::{Concept, unknown_operation};
use crate::core::dispatch::{self, Outcome};
use crate::core::error::AtollError;
use crate::core::id::Id;
use crate::core::store::Store;
use crate::core::value::{AttrDecl, AttrKind, Card, Record, RelationDecl, Value};
use clap::{Parser, Subcommand};

pub const CONCEPT: &str = "Labeling";
pub const PURPOSE: &str = "organize items by attaching named labels to them";

pub const RELATIONS: &[RelationDecl] = &[
    RelationDecl {
        name: "labels",
        attrs: &[AttrDecl { name: "name", kind: AttrKind::Str, card: Card::One }],
    },
    RelationDecl {
        name: "items",
        attrs: &[AttrDecl { name: "labels", kind: AttrKind::Id, card: Card::Set }],
    },
];

const ACTIONS: &[&str] = &["createLabel", "addLabel", "deleteLabel"];
const QUERIES: &[&str] = &["_labels", "_items"];

pub struct Labeling {
    store: Store,
    labels: Binding,
    items: Binding,
}

impl Labeling {
    /// Bind this concept's relations against the injected store.
    pub fn bind(store: &Store) -> Result<Self, AtollError> {
        let mut bound = binder::bind(store, CONCEPT, RELATIONS)?;
        let items = bound.pop().ok_or_else(|| {
            AtollError::InvariantViolation("Labeling bound fewer relations than declared".into())
        })?;
        let labels = bound.pop().ok_or_else(|| {
            AtollError::InvariantViolation("Labeling bound fewer relations than declared".into())
        })?;
        Ok(Labeling { store: store.clone(), labels, items })
    }

    /// `createLabel {name} -> {}`
    ///
    /// requires: no label with this name. effect: a fresh label entity.
    pub fn create_label(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "createLabel", |conn| {
            if let Err(msg) = input.expect_shape(&["name"]) {
                return Ok(Outcome::error(msg));
            }
            let name = match input.require_str("name") {
                Ok(n) => n.to_string(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let same_name = Record::new().with("name", Value::Str(name.clone()));
            if !self.labels.find(conn, &same_name)?.is_empty() {
                return Ok(Outcome::error(format!("label already exists: {}", name)));
            }
            let entity = Record::new()
                .with("_id", Value::Id(Id::fresh()))
                .with("name", Value::Str(name));
            self.labels.insert(conn, &entity)?;
            Ok(Outcome::ok())
        })
    }

    /// `addLabel {item, label} -> {}`
    ///
    /// requires: the label exists. effect: ensure the item's label set
    /// contains the label. Idempotent: the documented effect is membership,
    /// so re-adding an attached label is a no-op, not a conflict.
    pub fn add_label(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "addLabel", |conn| {
            if let Err(msg) = input.expect_shape(&["item", "label"]) {
                return Ok(Outcome::error(msg));
            }
            let item = match input.require_id("item") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let label = match input.require_id("label") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            if self.labels.get(conn, &label)?.is_none() {
                return Ok(Outcome::error("label not found"));
            }
            match self.items.get(conn, &item)? {
                Some(doc) => {
                    let mut members = match doc.get("labels") {
                        Some(Value::List(m)) => m.clone(),
                        _ => Vec::new(),
                    };
                    let wanted = Value::Id(label);
                    if !members.contains(&wanted) {
                        members.push(wanted);
                        let updated = doc.with("labels", Value::List(members));
                        self.items.replace(conn, &item, &updated)?;
                    }
                }
                None => {
                    let entity = Record::new()
                        .with("_id", Value::Id(item))
                        .with("labels", Value::List(vec![Value::Id(label)]));
                    self.items.insert(conn, &entity)?;
                }
            }
            Ok(Outcome::ok())
        })
    }

    /// `deleteLabel {item, label} -> {}`
    ///
    /// requires: the item currently carries the label. effect: remove it
    /// from the item's label set. The item document itself is kept; no
    /// action of this concept deletes documents implicitly.
    pub fn delete_label(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "deleteLabel", |conn| {
            if let Err(msg) = input.expect_shape(&["item", "label"]) {
                return Ok(Outcome::error(msg));
            }
            let item = match input.require_id("item") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let label = match input.require_id("label") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let doc = match self.items.get(conn, &item)? {
                Some(doc) => doc,
                None => return Ok(Outcome::error("label not attached")),
            };
            let members = match doc.get("labels") {
                Some(Value::List(m)) => m.clone(),
                _ => Vec::new(),
            };
            let wanted = Value::Id(label);
            if !members.contains(&wanted) {
                return Ok(Outcome::error("label not attached"));
            }
            let remaining: Vec<Value> = members.into_iter().filter(|m| *m != wanted).collect();
            let updated = doc.with("labels", Value::List(remaining));
            self.items.replace(conn, &item, &updated)?;
            Ok(Outcome::ok())
        })
    }

    /// `_labels(filter)` — label entities matching the filter.
    pub fn labels(&self, filter: &Record) -> Result<Vec<Record>, AtollError> {
        dispatch::run_query(&self.store, CONCEPT, "_labels", |conn| {
            self.labels.find(conn, filter)
        })
    }

    /// `_items(filter)` — item documents matching the filter. A scalar
    /// `labels` filter value matches items whose set contains that label.
    pub fn items(&self, filter: &Record) -> Result<Vec<Record>, AtollError> {
        dispatch::run_query(&self.store, CONCEPT, "_items", |conn| {
            self.items.find(conn, filter)
        })
    }
}

impl Concept for Labeling {
    fn name(&self) -> &'static str {
        CONCEPT
    }
    fn purpose(&self) -> &'static str {
        PURPOSE
    }
    fn relations(&self) -> &'static [RelationDecl] {
        RELATIONS
    }
    fn actions(&self) -> &'static [&'static str] {
        ACTIONS
    }
    fn queries(&self) -> &'static [&'static str] {
        QUERIES
    }

    fn act(&self, op: &str, input: &Record) -> Result<Outcome, AtollError> {
        match op {
            "createLabel" => self.create_label(input),
            "addLabel" => self.add_label(input),
            "deleteLabel" => self.delete_label(input),
            _ => Err(unknown_operation(CONCEPT, op)),
        }
    }

    fn query(&self, op: &str, filter: &Record) -> Result<Vec<Record>, AtollError> {
        match op {
            "_labels" => self.labels(filter),
            "_items" => self.items(filter),
            _ => Err(unknown_operation(CONCEPT, op)),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "label", about = "Drive the Labeling concept")]
pub struct LabelCli {
    #[clap(subcommand)]
    pub command: LabelCommand,
}

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    /// Create a new label.
    Create {
        #[clap(long)]
        name: String,
    },
    /// Attach a label to an item.
    Add {
        #[clap(long)]
        item: String,
        #[clap(long)]
        label: String,
    },
    /// Detach a label from an item.
    Delete {
        #[clap(long)]
        item: String,
        #[clap(long)]
        label: String,
    },
    /// List labels, optionally by name.
    Labels {
        #[clap(long)]
        name: Option<String>,
    },
    /// List items, optionally by attached label id.
    Items {
        #[clap(long)]
        label: Option<String>,
    },
}

pub fn run_label_cli(store: &Store, cli: LabelCli) -> Result<(), AtollError> {
    let concept = Labeling::bind(store)?;
    match cli.command {
        LabelCommand::Create { name } => {
            let input = Record::new().with("name", Value::Str(name));
            println!("{}", concept.create_label(&input)?.to_json());
        }
        LabelCommand::Add { item, label } => {
            let input = Record::new()
                .with("item", Value::Id(Id::unchecked(&item)))
                .with("label", Value::Id(Id::unchecked(&label)));
            println!("{}", concept.add_label(&input)?.to_json());
        }
        LabelCommand::Delete { item, label } => {
            let input = Record::new()
                .with("item", Value::Id(Id::unchecked(&item)))
                .with("label", Value::Id(Id::unchecked(&label)));
            println!("{}", concept.delete_label(&input)?.to_json());
        }
        LabelCommand::Labels { name } => {
            let mut filter = Record::new();
            if let Some(n) = name {
                filter.set("name", Value::Str(n));
            }
            for rec in concept.labels(&filter)? {
                println!("{}", rec.to_doc());
            }
        }
        LabelCommand::Items { label } => {
            let mut filter = Record::new();
            if let Some(l) = label {
                filter.set("labels", Value::Id(Id::unchecked(&l)));
            }
            for rec in concept.items(&filter)? {
                println!("{}", rec.to_doc());
            }
        }
    }
    Ok(())
}
