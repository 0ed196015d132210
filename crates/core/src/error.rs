//! Domain error model.

use thiserror::Error;

/// Result type used for local, deterministic checks.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Only local input problems live here; transport failures belong to the
/// client crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. empty).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
