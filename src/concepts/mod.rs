//! Concept instances.
//!
//! Each module here is one strictly isolated concept: it owns its state
//! relations, actions, and queries, and depends only on `crate::core`. The
//! roster below is the single place concepts are enumerated; the Isolation
//! Checker uses it to verify that no module reaches into a sibling.

pub mod comment;
pub mod label;
pub mod user;

/// (module file stem, concept name) pairs for every concept in the tree.
pub fn roster() -> &'static [(&'static str, &'static str)] {
    &[
        ("comment", comment::CONCEPT),
        ("label", label::CONCEPT),
        ("user", user::CONCEPT),
    ]
}
