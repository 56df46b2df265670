//! Core types for payment reconciliation

use chrono::{DateTime, Utc};
use ledger_core::ChainHash;
use order_engine::{LineItem, PaymentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asynchronous payment event delivered by the gateway (at-least-once)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutEvent {
    /// External checkout session id (the idempotency key)
    pub session_id: String,

    /// Gateway-side transaction id
    pub transaction_id: String,

    /// Buyer who paid
    pub buyer_id: Uuid,

    /// Paid line items
    pub line_items: Vec<LineItem>,

    /// Amount charged (must equal Σ quantity × unit price)
    pub amount: Decimal,
}

/// Durable record of one reconciled payment
///
/// For a given session id, at most one of these exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Order the payment committed
    pub order_id: Uuid,

    /// External checkout session id
    pub session_id: String,

    /// Amount charged
    pub amount: Decimal,

    /// Always `Completed` once recorded
    pub status: PaymentStatus,

    /// Gateway-side transaction id
    pub transaction_id: String,

    /// When the payment was reconciled
    pub created_at: DateTime<Utc>,
}

/// Result of processing one gateway delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    /// First delivery: order, payment record, and ledger entry committed
    Committed {
        /// Committed order id
        order_id: Uuid,
        /// Chain hash of the committing ledger entry
        chain_hash: ChainHash,
    },

    /// Repeat delivery of an already-processed session: safe no-op
    Duplicate {
        /// Order committed by the first delivery
        order_id: Uuid,
    },
}

/// Checkout session handed to the buyer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// External session id
    pub session_id: String,

    /// URL the buyer completes payment at
    pub checkout_url: String,

    /// Amount to charge
    pub amount: Decimal,
}

/// Read-only session state reported by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// External session id
    pub session_id: String,

    /// Whether the gateway has collected payment
    pub paid: bool,

    /// Session amount
    pub amount: Decimal,

    /// Gateway transaction id, once paid
    pub transaction_id: Option<String>,
}
