//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod forest;
pub mod identifiable;
pub mod tree_traits;

pub use arena::ReplyArena;
pub use builder::{build_forest, flatten};
pub use entities::{Post, ThreadDocument};
pub use error::{DomainError, DomainResult};
pub use forest::{Children, Forest, Node};
pub use identifiable::Identifiable;
pub use tree_traits::{render_tree, ToTreeString};

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~` via shellexpand. Unexpandable input is
/// returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
