//! HarvestRail Order Engine
//!
//! Order lifecycle management over a contention-safe stock store and the
//! hash-chained ledger.
//!
//! # Invariants
//!
//! - Stock never oversold: reservation is an atomic compare-and-decrement
//!   scoped to one product
//! - No partial commits: multi-item reservation is all-or-nothing, and a
//!   failed ledger append releases every reservation
//! - Status only moves forward along the lifecycle graph; cancellation only
//!   from pending, idempotent against retries

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod authz;
pub mod error;
pub mod manager;
pub mod stock;
pub mod types;

// Re-exports
pub use authz::{authorize, Requirement};
pub use error::{Error, Result};
pub use manager::OrderManager;
pub use stock::StockStore;
pub use types::{
    Actor, FarmerStats, LineItem, Order, OrderReceipt, OrderStatus, PaymentStatus, Role,
    StockRecord,
};
