//! HarvestRail Ledger Core
//!
//! Append-only hash-chained log of committed marketplace transactions.
//!
//! # Architecture
//!
//! - **Hash chain**: every entry commits to its predecessor's SHA-256 digest
//! - **Single writer**: one logical writer task eliminates tail races
//! - **Append-only**: entries are never modified or deleted
//! - **Fail-closed**: appends past their deadline are treated as not committed
//!
//! # Invariants
//!
//! - `entry[n].previous_hash == entry[n-1].current_hash` for all n > 0
//! - `entry[0].previous_hash` is the all-zero genesis sentinel
//! - `record.total == Σ(quantity × unit_price)` for every committed record

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use storage::Storage;
pub use types::{
    line_items_total, ChainHash, ChainTail, LedgerEntry, LineItem, TransactionRecord,
};
