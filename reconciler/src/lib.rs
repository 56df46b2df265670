//! HarvestRail Payment Reconciler
//!
//! Consumes at-least-once payment-gateway events, verifies their
//! authenticity, and drives the order engine exactly once per external
//! transaction.
//!
//! # Guarantees
//!
//! - Unverifiable events are rejected with no side effects
//! - Duplicate deliveries (same external session id) yield exactly one
//!   order, one payment record, and one stock deduction
//! - Notification failures never block or reverse a committed payment

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod gateway;
pub mod idempotency;
pub mod notify;
pub mod reconciler;
pub mod signature;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use gateway::{InProcessGateway, PaymentGateway};
pub use idempotency::{Claim, IdempotencyGuard};
pub use notify::{Notification, Notifier, TracingNotifier};
pub use reconciler::PaymentReconciler;
pub use signature::{GatewayKeyPair, SignatureVerifier};
pub use types::{CheckoutEvent, CheckoutSession, PaymentRecord, ReconcileOutcome, SessionStatus};
