//! tagtree: build a rooted tag forest from flat tag relations.
//!
//! Tags may have any number of parents, and the relations may contain
//! cycles, self references and references to tags that do not exist.
//! [`domain::TreeBuilder`] turns such a snapshot into a finite forest
//! without ever failing.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
