//! Comment concept: comments by an author on a target.
//!
//! Principle: a posted comment can be found under its target, in posting
//! order, until removed. Both `author` and `target` are opaque foreign
//! Identifiers — whatever concepts own those entities, this one never sees
//! their records, only their ids.

use crate::core::binder::{self, Binding};
use crate::core::concept::{Concept, unknown_operation};
use crate::core::dispatch::{self, Outcome};
use crate::core::error::AtollError;
use crate::core::id::Id;
use crate::core::store::Store;
use crate::core::value::{AttrDecl, AttrKind, Card, Record, RelationDecl, Value};
use clap::{Parser, Subcommand};

pub const CONCEPT: &str = "Comment";
pub const PURPOSE: &str = "let authors attach text commentary to targets";

pub const RELATIONS: &[RelationDecl] = &[RelationDecl {
    name: "comments",
    attrs: &[
        AttrDecl { name: "author", kind: AttrKind::Id, card: Card::One },
        AttrDecl { name: "target", kind: AttrKind::Id, card: Card::One },
        AttrDecl { name: "text", kind: AttrKind::Str, card: Card::One },
    ],
}];

const ACTIONS: &[&str] = &["post", "edit", "remove"];
const QUERIES: &[&str] = &["_comments"];

pub struct Comment {
    store: Store,
    comments: Binding,
}

impl Comment {
    pub fn bind(store: &Store) -> Result<Self, AtollError> {
        let mut bound = binder::bind(store, CONCEPT, RELATIONS)?;
        let comments = bound.pop().ok_or_else(|| {
            AtollError::InvariantViolation("Comment bound fewer relations than declared".into())
        })?;
        Ok(Comment { store: store.clone(), comments })
    }

    /// `post {author, target, text} -> {comment: Id}`
    ///
    /// requires: text is non-empty.
    pub fn post(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "post", |conn| {
            if let Err(msg) = input.expect_shape(&["author", "target", "text"]) {
                return Ok(Outcome::error(msg));
            }
            let author = match input.require_id("author") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let target = match input.require_id("target") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let text = match input.require_str("text") {
                Ok(t) => t.to_string(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            if text.trim().is_empty() {
                return Ok(Outcome::error("text must not be empty"));
            }
            let comment = Id::fresh();
            let entity = Record::new()
                .with("_id", Value::Id(comment.clone()))
                .with("author", Value::Id(author))
                .with("target", Value::Id(target))
                .with("text", Value::Str(text));
            self.comments.insert(conn, &entity)?;
            Ok(Outcome::success(
                Record::new().with("comment", Value::Id(comment)),
            ))
        })
    }

    /// `edit {comment, text} -> {}`
    ///
    /// requires: the comment exists and text is non-empty.
    pub fn edit(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "edit", |conn| {
            if let Err(msg) = input.expect_shape(&["comment", "text"]) {
                return Ok(Outcome::error(msg));
            }
            let comment = match input.require_id("comment") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let text = match input.require_str("text") {
                Ok(t) => t.to_string(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            if text.trim().is_empty() {
                return Ok(Outcome::error("text must not be empty"));
            }
            let doc = match self.comments.get(conn, &comment)? {
                Some(doc) => doc,
                None => return Ok(Outcome::error("comment not found")),
            };
            let updated = doc.with("text", Value::Str(text));
            self.comments.replace(conn, &comment, &updated)?;
            Ok(Outcome::ok())
        })
    }

    /// `remove {comment} -> {}`
    ///
    /// requires: the comment exists. effect: the comment is deleted.
    pub fn remove(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "remove", |conn| {
            if let Err(msg) = input.expect_shape(&["comment"]) {
                return Ok(Outcome::error(msg));
            }
            let comment = match input.require_id("comment") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            if self.comments.get(conn, &comment)?.is_none() {
                return Ok(Outcome::error("comment not found"));
            }
            self.comments.remove(conn, &comment)?;
            Ok(Outcome::ok())
        })
    }

    /// `_comments(filter)` — comments matching the filter, in posting order.
    pub fn comments(&self, filter: &Record) -> Result<Vec<Record>, AtollError> {
        dispatch::run_query(&self.store, CONCEPT, "_comments", |conn| {
            self.comments.find(conn, filter)
        })
    }
}

impl Concept for Comment {
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
            "post" => self.post(input),
            "edit" => self.edit(input),
            "remove" => self.remove(input),
            _ => Err(unknown_operation(CONCEPT, op)),
        }
    }

    fn query(&self, op: &str, filter: &Record) -> Result<Vec<Record>, AtollError> {
        match op {
            "_comments" => self.comments(filter),
            _ => Err(unknown_operation(CONCEPT, op)),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "comment", about = "Drive the Comment concept")]
pub struct CommentCli {
    #[clap(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    /// Post a comment on a target.
    Post {
        #[clap(long)]
        author: String,
        #[clap(long)]
        target: String,
        #[clap(long)]
        text: String,
    },
    /// Edit an existing comment's text.
    Edit {
        #[clap(long)]
        id: String,
        #[clap(long)]
        text: String,
    },
    /// Remove a comment.
    Remove {
        #[clap(long)]
        id: String,
    },
    /// List comments, optionally by target or author id.
    List {
        #[clap(long)]
        target: Option<String>,
        #[clap(long)]
        author: Option<String>,
    },
}

pub fn run_comment_cli(store: &Store, cli: CommentCli) -> Result<(), AtollError> {
    let concept = Comment::bind(store)?;
    match cli.command {
        CommentCommand::Post { author, target, text } => {
            let input = Record::new()
                .with("author", Value::Id(Id::unchecked(&author)))
                .with("target", Value::Id(Id::unchecked(&target)))
                .with("text", Value::Str(text));
            println!("{}", concept.post(&input)?.to_json());
        }
        CommentCommand::Edit { id, text } => {
            let input = Record::new()
                .with("comment", Value::Id(Id::unchecked(&id)))
                .with("text", Value::Str(text));
            println!("{}", concept.edit(&input)?.to_json());
        }
        CommentCommand::Remove { id } => {
            let input = Record::new().with("comment", Value::Id(Id::unchecked(&id)));
            println!("{}", concept.remove(&input)?.to_json());
        }
        CommentCommand::List { target, author } => {
            let mut filter = Record::new();
            if let Some(t) = target {
                filter.set("target", Value::Id(Id::unchecked(&t)));
            }
            if let Some(a) = author {
                filter.set("author", Value::Id(Id::unchecked(&a)));
            }
            for rec in concept.comments(&filter)? {
                println!("{}", rec.to_doc());
            }
        }
    }
    Ok(())
}
