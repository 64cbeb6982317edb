//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
///
/// Tree construction itself never fails; these cover record shape and
/// option parsing only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid tag record at position {position}: {message}")]
    InvalidRecord { position: usize, message: String },

    #[error("unknown dangling-parent policy: {0} (expected 'root' or 'exclude')")]
    UnknownPolicy(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
