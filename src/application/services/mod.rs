//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (TagSource, FileSystem)
//! but are themselves concrete structs, not traits.

mod tag_tree;

pub use tag_tree::{TagTreeService, TreeResponse};
