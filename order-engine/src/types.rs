//! Core types for the order engine

use chrono::{DateTime, Utc};
use ledger_core::ChainHash;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchased product line (part of the canonical ledger payload)
pub type LineItem = ledger_core::LineItem;

/// Order lifecycle status
///
/// Fulfilment advances strictly forward:
/// pending → processing → shipped → delivered. Cancellation is only
/// reachable from pending; paid marks gateway-settled orders and is
/// financially terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting fulfilment (initial buyer-created state)
    Pending,
    /// Being prepared by the farmer
    Processing,
    /// Handed to delivery
    Shipped,
    /// Received by the buyer (terminal)
    Delivered,
    /// Cancelled by the buyer before fulfilment (terminal)
    Cancelled,
    /// Settled through the payment gateway (terminal)
    Paid,
}

impl OrderStatus {
    /// Position along the fulfilment chain (None for states outside it)
    fn fulfilment_rank(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled | OrderStatus::Paid => None,
        }
    }

    /// Check whether `next` is forward-reachable from this status
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        match (self.fulfilment_rank(), next.fulfilment_rank()) {
            (Some(current), Some(target)) => target > current,
            _ => false,
        }
    }

    /// Check if no further transitions are allowed
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Paid
        )
    }
}

/// Payment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Not yet paid
    Pending,
    /// Settled by the gateway
    Completed,
}

/// A committed marketplace order
///
/// Owned exclusively by the order manager once created; line items are
/// immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID (UUIDv7 for time-ordering)
    pub order_id: Uuid,

    /// Buyer who placed the order
    pub buyer_id: Uuid,

    /// Purchased line items
    pub line_items: Vec<LineItem>,

    /// Order total (== Σ quantity × unit price)
    pub total: Decimal,

    /// Lifecycle status
    pub status: OrderStatus,

    /// Payment status
    pub payment_status: PaymentStatus,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Check whether a farmer owns at least one line item
    pub fn has_farmer(&self, farmer_id: Uuid) -> bool {
        self.line_items.iter().any(|item| item.farmer_id == farmer_id)
    }
}

/// Role resolved from the request's bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Places and cancels orders
    Buyer,
    /// Fulfils orders containing their products
    Farmer,
    /// Full access
    Admin,
}

/// Verified identity performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id from the auth collaborator
    pub user_id: Uuid,

    /// Resolved role
    pub role: Role,
}

/// Per-product stock and price
///
/// The only entity two orders can legitimately contend over. Title and
/// farmer are carried so a cart of product ids can be resolved into full
/// line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Product id
    pub product_id: Uuid,

    /// Product title
    pub title: String,

    /// Farmer who owns the product
    pub farmer_id: Uuid,

    /// Available quantity (never negative)
    pub quantity: u32,

    /// Current unit price
    pub price: Decimal,
}

/// Receipt returned when an order commits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// Committed order id
    pub order_id: Uuid,

    /// Chain hash of the ledger entry that committed it
    pub chain_hash: ChainHash,
}

/// Aggregate earnings for a farmer's owned line items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmerStats {
    /// Orders containing at least one owned line item
    pub order_count: u64,

    /// Units sold across owned line items
    pub units_sold: u64,

    /// Σ quantity × unit price over owned line items
    pub gross_earnings: Decimal,
}
