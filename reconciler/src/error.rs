//! Error types for payment reconciliation

use thiserror::Error;

/// Result type for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler errors
#[derive(Error, Debug)]
pub enum Error {
    /// Gateway event signature did not verify
    #[error("Signature verification failed: {0}")]
    Signature(String),

    /// Event payload could not be parsed or is internally inconsistent
    #[error("Malformed event: {0}")]
    Malformed(String),

    /// A delivery raced another in-flight delivery of the same session
    #[error("Delivery for session {0} is already in flight")]
    ConcurrentDelivery(String),

    /// Payment gateway call failed
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Checkout session unknown to the gateway
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Gateway call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Order engine rejected the event's order
    #[error(transparent)]
    Order(#[from] order_engine::Error),

    /// Notification delivery failed (logged, never surfaced to callers)
    #[error("Notification failed: {0}")]
    Notification(String),
}
