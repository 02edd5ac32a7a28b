//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business/domain failures (validation,
/// invariants, conflicts). Every variant maps to exactly one HTTP status at
/// the API boundary; `Internal` is the only one whose detail is never sent
/// to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A batch entry would drive a product quantity negative.
    ///
    /// `index` points at the offending entry in the coalesced batch.
    #[error("Not enough stock")]
    InsufficientStock { index: usize },

    /// A batch entry referenced a product that does not exist.
    ///
    /// `index` points at the offending entry in the coalesced batch.
    #[error("Unknown product in batch")]
    InvalidProductReference { index: usize },

    /// A store-level uniqueness constraint was violated.
    #[error("{message}")]
    UniquenessConflict { field: &'static str, message: String },

    /// An unexpected lower-level failure. The detail is logged, never
    /// surfaced to the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn insufficient_stock(index: usize) -> Self {
        Self::InsufficientStock { index }
    }

    pub fn invalid_product_reference(index: usize) -> Self {
        Self::InvalidProductReference { index }
    }

    pub fn uniqueness_conflict(field: &'static str, message: impl Into<String>) -> Self {
        Self::UniquenessConflict {
            field,
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
