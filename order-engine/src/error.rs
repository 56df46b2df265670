//! Error types for the order engine

use thiserror::Error;
use uuid::Uuid;

/// Result type for order engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Order engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conditional stock decrement could not be satisfied
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock {
        /// First product whose reservation failed
        product_id: Uuid,
    },

    /// Order or product not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Actor lacks the required role or relationship
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Illegal status transition or double-cancel
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Ledger append or query failed
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
