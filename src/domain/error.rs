//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors reject reply collections that cannot form a forest.
///
/// Ids are carried in their `Debug` rendering so the error stays independent
/// of the item type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate item id: {0}")]
    DuplicateId(String),

    #[error("cycle detected in reply hierarchy at item: {0}")]
    CycleDetected(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
