//! Shared runtime layer for Atoll concepts.
//!
//! Everything a concept implementation is allowed to depend on lives here:
//! the identifier generator, the value universe, the state binder, the
//! action/query dispatch, and the isolation checker. Concepts depend on
//! `core` and on nothing else.

pub mod binder;
pub mod concept;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod isolation;
pub mod store;
pub mod time;
pub mod value;
