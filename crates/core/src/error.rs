//! Ledger error model.

use thiserror::Error;

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error taxonomy for the inventory ledger.
///
/// Every variant maps to a stable condition code (see [`LedgerError::code`])
/// so callers can always tell "nothing happened" (`NotFound`, `Validation`)
/// apart from "the mutation happened but a secondary write may be incomplete"
/// (`Storage` during an audit append).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The referenced item id is unknown.
    #[error("item not found")]
    NotFound,

    /// Case-insensitive name collision within an owner's items.
    #[error("an item named '{name}' already exists")]
    DuplicateName { name: String },

    /// A sale would drive the quantity below zero.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { available: i64, requested: i64 },

    /// A value failed validation (non-positive sell/restock quantity,
    /// malformed identifier, blank name/unit, negative quantity/price).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Underlying store unavailable. Not retried internally; propagated
    /// verbatim, except for audit appends which are logged and swallowed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    pub fn insufficient_stock(available: i64, requested: i64) -> Self {
        Self::InsufficientStock {
            available,
            requested,
        }
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Stable machine-readable condition code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DuplicateName { .. } => "duplicate_name",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::Validation(_) => "validation_error",
            Self::Storage(_) => "storage_error",
        }
    }
}
