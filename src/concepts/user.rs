//! User concept: register and manage user entities.
//!
//! Principle: a registered user can be found by name until renamed or
//! unregistered. Other concepts refer to users only by the Identifier that
//! `register` returns; nothing here is visible to them otherwise.

use crate::core::binder::{self, Binding};
use crate::core::concept::{Concept, unknown_operation};
use crate::core::dispatch::{self, Outcome};
use crate::core::error::AtollError;
use crate::core::id::Id;
use crate::core::store::Store;
use crate::core::value::{AttrDecl, AttrKind, Card, Record, RelationDecl, Value};
use clap::{Parser, Subcommand};

pub const CONCEPT: &str = "User";
pub const PURPOSE: &str = "register users under unique names";

pub const RELATIONS: &[RelationDecl] = &[RelationDecl {
    name: "users",
    attrs: &[AttrDecl { name: "name", kind: AttrKind::Str, card: Card::One }],
}];

const ACTIONS: &[&str] = &["register", "rename", "unregister"];
const QUERIES: &[&str] = &["_users"];

pub struct User {
    store: Store,
    users: Binding,
}

impl User {
    pub fn bind(store: &Store) -> Result<Self, AtollError> {
        let mut bound = binder::bind(store, CONCEPT, RELATIONS)?;
        let users = bound.pop().ok_or_else(|| {
            AtollError::InvariantViolation("User bound fewer relations than declared".into())
        })?;
        Ok(User { store: store.clone(), users })
    }

    /// `register {name} -> {user: Id}`
    ///
    /// requires: the name is unused. effect: a fresh user entity; the new
    /// Identifier is returned so other concepts can carry it opaquely.
    pub fn register(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "register", |conn| {
            if let Err(msg) = input.expect_shape(&["name"]) {
                return Ok(Outcome::error(msg));
            }
            let name = match input.require_str("name") {
                Ok(n) => n.to_string(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let same_name = Record::new().with("name", Value::Str(name.clone()));
            if !self.users.find(conn, &same_name)?.is_empty() {
                return Ok(Outcome::error(format!("name already taken: {}", name)));
            }
            let user = Id::fresh();
            let entity = Record::new()
                .with("_id", Value::Id(user.clone()))
                .with("name", Value::Str(name));
            self.users.insert(conn, &entity)?;
            Ok(Outcome::success(Record::new().with("user", Value::Id(user))))
        })
    }

    /// `rename {user, name} -> {}`
    ///
    /// requires: the user exists and the new name is unused.
    pub fn rename(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "rename", |conn| {
            if let Err(msg) = input.expect_shape(&["user", "name"]) {
                return Ok(Outcome::error(msg));
            }
            let user = match input.require_id("user") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let name = match input.require_str("name") {
                Ok(n) => n.to_string(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            let doc = match self.users.get(conn, &user)? {
                Some(doc) => doc,
                None => return Ok(Outcome::error("user not found")),
            };
            let same_name = Record::new().with("name", Value::Str(name.clone()));
            let taken = self.users.find(conn, &same_name)?;
            if taken.iter().any(|rec| rec.id() != Some(&user)) {
                return Ok(Outcome::error(format!("name already taken: {}", name)));
            }
            let updated = doc.with("name", Value::Str(name));
            self.users.replace(conn, &user, &updated)?;
            Ok(Outcome::ok())
        })
    }

    /// `unregister {user} -> {}`
    ///
    /// requires: the user exists. effect: the user document is deleted.
    /// This is the only operation that removes documents from `users`.
    pub fn unregister(&self, input: &Record) -> Result<Outcome, AtollError> {
        dispatch::run_action(&self.store, CONCEPT, "unregister", |conn| {
            if let Err(msg) = input.expect_shape(&["user"]) {
                return Ok(Outcome::error(msg));
            }
            let user = match input.require_id("user") {
                Ok(id) => id.clone(),
                Err(msg) => return Ok(Outcome::error(msg)),
            };
            if self.users.get(conn, &user)?.is_none() {
                return Ok(Outcome::error("user not found"));
            }
            self.users.remove(conn, &user)?;
            Ok(Outcome::ok())
        })
    }

    /// `_users(filter)` — user entities matching the filter.
    pub fn users(&self, filter: &Record) -> Result<Vec<Record>, AtollError> {
        dispatch::run_query(&self.store, CONCEPT, "_users", |conn| {
            self.users.find(conn, filter)
        })
    }
}

impl Concept for User {
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
            "register" => self.register(input),
            "rename" => self.rename(input),
            "unregister" => self.unregister(input),
            _ => Err(unknown_operation(CONCEPT, op)),
        }
    }

    fn query(&self, op: &str, filter: &Record) -> Result<Vec<Record>, AtollError> {
        match op {
            "_users" => self.users(filter),
            _ => Err(unknown_operation(CONCEPT, op)),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "user", about = "Drive the User concept")]
pub struct UserCli {
    #[clap(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a new user.
    Register {
        #[clap(long)]
        name: String,
    },
    /// Rename an existing user.
    Rename {
        #[clap(long)]
        id: String,
        #[clap(long)]
        name: String,
    },
    /// Unregister (delete) a user.
    Unregister {
        #[clap(long)]
        id: String,
    },
    /// List users, optionally by name.
    List {
        #[clap(long)]
        name: Option<String>,
    },
}

pub fn run_user_cli(store: &Store, cli: UserCli) -> Result<(), AtollError> {
    let concept = User::bind(store)?;
    match cli.command {
        UserCommand::Register { name } => {
            let input = Record::new().with("name", Value::Str(name));
            println!("{}", concept.register(&input)?.to_json());
        }
        UserCommand::Rename { id, name } => {
            let input = Record::new()
                .with("user", Value::Id(Id::unchecked(&id)))
                .with("name", Value::Str(name));
            println!("{}", concept.rename(&input)?.to_json());
        }
        UserCommand::Unregister { id } => {
            let input = Record::new().with("user", Value::Id(Id::unchecked(&id)));
            println!("{}", concept.unregister(&input)?.to_json());
        }
        UserCommand::List { name } => {
            let mut filter = Record::new();
            if let Some(n) = name {
                filter.set("name", Value::Str(n));
            }
            for rec in concept.users(&filter)? {
                println!("{}", rec.to_doc());
            }
        }
    }
    Ok(())
}
