//! Stock store with atomic per-product reservation
//!
//! Every mutation runs under the DashMap shard guard for its product, so a
//! reserve is a single compare-and-decrement: concurrent orders touching
//! disjoint products proceed in parallel, while orders contending on one
//! product serialize around that product's counter only. A separate read
//! then write would allow two orders to both observe the same quantity and
//! oversell.

use crate::{
    error::{Error, Result},
    types::{LineItem, StockRecord},
};
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Authoritative per-product quantity and price store
#[derive(Default)]
pub struct StockStore {
    records: DashMap<Uuid, StockRecord>,
}

impl StockStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product record
    pub fn insert(&self, record: StockRecord) {
        self.records.insert(record.product_id, record);
    }

    /// Snapshot one product record
    pub fn record(&self, product_id: Uuid) -> Result<StockRecord> {
        self.records
            .get(&product_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::NotFound(format!("product {}", product_id)))
    }

    /// Current available quantity
    pub fn quantity(&self, product_id: Uuid) -> Result<u32> {
        Ok(self.record(product_id)?.quantity)
    }

    /// Atomically check `quantity >= qty` and decrement
    ///
    /// The check and the decrement happen under one shard write guard;
    /// quantity can never go below zero.
    pub fn reserve(&self, product_id: Uuid, qty: u32) -> Result<()> {
        let mut record = self
            .records
            .get_mut(&product_id)
            .ok_or_else(|| Error::NotFound(format!("product {}", product_id)))?;

        if record.quantity < qty {
            return Err(Error::InsufficientStock { product_id });
        }

        record.quantity -= qty;
        Ok(())
    }

    /// Atomically increment quantity (cancellation / rollback)
    pub fn release(&self, product_id: Uuid, qty: u32) -> Result<()> {
        let mut record = self
            .records
            .get_mut(&product_id)
            .ok_or_else(|| Error::NotFound(format!("product {}", product_id)))?;

        record.quantity = record.quantity.saturating_add(qty);
        Ok(())
    }

    /// All-or-nothing reservation across line items
    ///
    /// Reserves each line in order; on the first failure, issues
    /// compensating releases for every line already reserved and surfaces
    /// the offending product. No partial reservation survives.
    pub fn reserve_all(&self, items: &[LineItem]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            if let Err(e) = self.reserve(item.product_id, item.quantity) {
                self.release_all(&items[..index]);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Best-effort compensating release across line items
    ///
    /// Unknown products are logged and skipped; compensation must not fail
    /// the surrounding rollback.
    pub fn release_all(&self, items: &[LineItem]) {
        for item in items {
            if let Err(e) = self.release(item.product_id, item.quantity) {
                tracing::warn!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %e,
                    "Compensating release failed"
                );
            }
        }
    }

    /// Resolve a cart of (product, quantity) requests into full line items
    ///
    /// Titles, prices, and farmers come from the authoritative records;
    /// quantities must be positive.
    pub fn resolve_items(&self, requests: &[(Uuid, u32)]) -> Result<Vec<LineItem>> {
        if requests.is_empty() {
            return Err(Error::Validation("Cart must not be empty".to_string()));
        }

        let mut items = Vec::with_capacity(requests.len());
        for &(product_id, quantity) in requests {
            if quantity == 0 {
                return Err(Error::Validation(format!(
                    "Quantity for product {} must be positive",
                    product_id
                )));
            }

            let record = self.record(product_id)?;
            items.push(LineItem {
                product_id,
                title: record.title,
                quantity,
                unit_price: record.price,
                farmer_id: record.farmer_id,
            });
        }

        Ok(items)
    }

    /// Validate that client-supplied prices match the authoritative records
    pub fn validate_prices(&self, items: &[LineItem]) -> Result<()> {
        for item in items {
            let record = self.record(item.product_id)?;
            if item.unit_price != record.price {
                return Err(Error::Validation(format!(
                    "Unit price {} for product {} does not match listed price {}",
                    item.unit_price, item.product_id, record.price
                )));
            }
        }
        Ok(())
    }

    /// Number of products tracked
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check for an empty store
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Convenience seed helper used by config bootstrap and tests
pub fn seed_record(product_id: Uuid, title: &str, farmer_id: Uuid, quantity: u32, price: Decimal) -> StockRecord {
    StockRecord {
        product_id,
        title: title.to_string(),
        farmer_id,
        quantity,
        price,
    }
}
