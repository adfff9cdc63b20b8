//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Only cart and order commands produce these. Variant resolution never fails;
/// missing or partial product data degrades to permissive defaults instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. order already cancelled).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested quantity exceeds the tracked stock of a variant.
    #[error("only {available} items available in stock for this variant (requested {requested})")]
    InsufficientStock { requested: u32, available: i64 },

    /// The selected option combination is marked unavailable.
    #[error("variant unavailable: {0}")]
    Unavailable(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Whether retrying the same command could succeed once data changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InsufficientStock { .. } | Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_both_quantities() {
        let err = DomainError::InsufficientStock {
            requested: 7,
            available: 5,
        };
        assert_eq!(
            err.to_string(),
            "only 5 items available in stock for this variant (requested 7)"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_is_not_retryable() {
        assert!(!DomainError::validation("quantity must be at least 1").is_retryable());
    }
}
