//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failures of the partner model itself.
///
/// Collaborator failures (ERP, cipher, mail) have their own error types in the
/// crates that define those seams.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A business partner key was empty or does not fit the ERP column.
    #[error("invalid business partner key: {0}")]
    InvalidKey(String),

    /// A postal field failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A state change would break a partner invariant.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}
