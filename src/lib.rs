//! Atoll: isolated state concepts over a shared store.
//!
//! **Atoll is a runtime convention for building independently deployable,
//! strictly isolated units of application state.**
//!
//! Each unit — a *concept* — owns a private persistent schema and exposes it
//! only through two operation kinds: **actions** (state-mutating, one record
//! in, one record out) and **queries** (read-only projections returning
//! sequences). The contract, not any single concept's business logic, is the
//! point: it is what makes many such units safely composable later by an
//! external coordinator without ever coupling their implementations.
//!
//! # Core Rules
//!
//! - **One store, injected once**: a concept receives the shared store
//!   handle at construction and binds its relations from it; no ambient lookup
//! - **Namespaced collections**: each declared relation is one collection,
//!   `{ConceptName}.{relationName}`, keyed by an opaque Identifier
//! - **Errors are values**: precondition violations, missing entities, and
//!   conflicts come back as `{error: ...}` records; only infrastructure
//!   failures and programming defects terminate an invocation
//! - **Queries never write**: the query executor pins its connection
//!   read-only, so purity is enforced by the store, not by convention
//! - **Foreign entities are ids**: anything crossing a concept boundary is an
//!   opaque Identifier, never a materialized foreign record
//! - **Isolation is checked, not hoped for**: `atoll check` statically
//!   verifies that no concept module references another concept's module or
//!   collection namespace
//!
//! # Crate Structure
//!
//! - `core`: shared runtime (ids, value universe, binder, dispatch, checker)
//! - [`concepts`]: concept instances (Labeling, User, Comment)

pub mod concepts;
pub mod core;

use crate::concepts::comment::{self, CommentCli};
use crate::concepts::label::{self, LabelCli};
use crate::concepts::user::{self, UserCli};
use crate::core::concept::{Concept, describe};
use crate::core::isolation;
use crate::core::store::Store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "atoll",
    version = env!("CARGO_PKG_VERSION"),
    about = "Isolated state concepts over a shared store"
)]
struct Cli {
    /// Store root directory.
    #[clap(long, default_value = ".atoll/data", global = true)]
    store: PathBuf,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the store and bind every concept's relations.
    Init,
    /// Print each concept's declared surface as JSON.
    Schema,
    /// Run the isolation gate over a source tree.
    Check {
        /// Source root containing the concepts/ directory.
        #[clap(long, default_value = "src")]
        src: PathBuf,
    },
    /// Drive the Labeling concept.
    Label(LabelCli),
    /// Drive the User concept.
    User(UserCli),
    /// Drive the Comment concept.
    Comment(CommentCli),
}

fn bound_concepts(store: &Store) -> anyhow::Result<Vec<Box<dyn Concept>>> {
    Ok(vec![
        Box::new(concepts::label::Labeling::bind(store)?),
        Box::new(concepts::user::User::bind(store)?),
        Box::new(concepts::comment::Comment::bind(store)?),
    ])
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init => {
            let store = Store::open(&cli.store)?;
            let bound = bound_concepts(&store)?;
            println!(
                "Store initialized at {} ({} concepts bound)",
                store.root.display(),
                bound.len()
            );
        }
        Command::Schema => {
            let store = Store::open(&cli.store)?;
            for concept in bound_concepts(&store)? {
                println!("{}", describe(concept.as_ref()));
            }
        }
        Command::Check { src } => {
            if !isolation::run_check(&src, concepts::roster())? {
                std::process::exit(1);
            }
        }
        Command::Label(args) => {
            let store = Store::open(&cli.store)?;
            label::run_label_cli(&store, args)?;
        }
        Command::User(args) => {
            let store = Store::open(&cli.store)?;
            user::run_user_cli(&store, args)?;
        }
        Command::Comment(args) => {
            let store = Store::open(&cli.store)?;
            comment::run_comment_cli(&store, args)?;
        }
    }
    Ok(())
}
