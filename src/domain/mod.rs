//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod diagnostics;
pub mod display;
pub mod entities;
pub mod error;

pub use builder::{build_tree, DanglingParents, TreeBuilder, TreeOptions};
pub use diagnostics::{Edge, TopologyReport};
pub use display::{render_ascii, TreeNodeConvert};
pub use entities::*;
pub use error::{DomainError, DomainResult};
