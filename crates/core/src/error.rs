//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every lifecycle operation fails with exactly one of these. Helpers raise the
/// most specific variant and callers propagate it unchanged, so the API layer
/// can map variants to status codes without inspecting messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or inconsistent input (shape, totals, caps, transitions).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Not enough stock to reserve the requested quantity.
    ///
    /// A specialization of `Validation` that can be caused purely by a
    /// concurrent reservation, which makes it the only retryable failure.
    #[error(
        "insufficient stock for product {product_name} ({product_id}): available {available}, requested {requested}"
    )]
    Availability {
        product_id: ProductId,
        product_name: String,
        available: u32,
        requested: u32,
    },

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced order, customer, enterprise or product does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness or state conflict (duplicate order number, terminal order,
    /// stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing record store could not serve the request.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Coarse classification of a [`DomainError`], used for logging and for
/// mapping onto transport status codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Availability,
    NotFound,
    Conflict,
    Internal,
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

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn availability(
        product_id: ProductId,
        product_name: impl Into<String>,
        available: u32,
        requested: u32,
    ) -> Self {
        Self::Availability {
            product_id,
            product_name: product_name.into(),
            available,
            requested,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) | DomainError::InvalidId(_) => ErrorKind::Validation,
            DomainError::Availability { .. } => ErrorKind::Availability,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::InvariantViolation(_) | DomainError::Unavailable(_) => ErrorKind::Internal,
        }
    }

    /// True for bad input, including insufficient stock.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Availability)
    }

    /// True only when retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Availability { .. })
    }
}
