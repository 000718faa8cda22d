//! Ledger error model.

use thiserror::Error;

use crate::id::{OpnameId, ProductId};

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Keep this focused on deterministic business failures (validation,
/// invariants, missing records). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A mutation was requested with a non-positive (or negative, for counts)
    /// quantity.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// A ledger invariant was violated. Fatal: aborts the enclosing unit of
    /// work.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A stock count was submitted for approval with no items.
    #[error("stock count has no items")]
    EmptyCount,

    /// The referenced product is not registered in the ledger.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The referenced stock count does not exist.
    #[error("stock count not found: {0}")]
    CountNotFound(OpnameId),

    /// A reporting range whose end precedes its start (or that cannot be
    /// represented).
    #[error("invalid date range: {0}")]
    DateRangeInvalid(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn date_range(msg: impl Into<String>) -> Self {
        Self::DateRangeInvalid(msg.into())
    }
}
