//! Order lifecycle manager
//!
//! Sole writer to the stock store and the ledger for a given order. Both
//! entry points (a buyer-initiated pending order and a gateway-initiated
//! paid order) funnel through one commit path: validate, reserve stock
//! all-or-nothing, append to the ledger, only then make the order visible.
//! A ledger failure after reservation triggers compensating releases; the
//! client never observes a half-committed order.

use crate::{
    authz::{authorize, Requirement},
    error::{Error, Result},
    stock::StockStore,
    types::{Actor, FarmerStats, LineItem, Order, OrderReceipt, OrderStatus, PaymentStatus},
};
use chrono::Utc;
use dashmap::DashMap;
use ledger_core::{Ledger, TransactionRecord};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Owns order entities and orchestrates stock reservation, status
/// transitions, and ledger appends
pub struct OrderManager {
    orders: DashMap<Uuid, Order>,
    stock: Arc<StockStore>,
    ledger: Arc<Ledger>,
}

impl OrderManager {
    /// Create a manager over the shared stock store and ledger
    pub fn new(stock: Arc<StockStore>, ledger: Arc<Ledger>) -> Self {
        Self {
            orders: DashMap::new(),
            stock,
            ledger,
        }
    }

    /// Shared stock store
    pub fn stock(&self) -> &Arc<StockStore> {
        &self.stock
    }

    /// Shared ledger
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Create a buyer-initiated order (status pending, payment pending)
    pub async fn create_order(&self, buyer_id: Uuid, line_items: Vec<LineItem>) -> Result<OrderReceipt> {
        self.validate_items(&line_items)?;
        self.stock.validate_prices(&line_items)?;

        self.commit_order(buyer_id, line_items, OrderStatus::Pending, PaymentStatus::Pending)
            .await
    }

    /// Record a gateway-settled order (status paid, payment completed)
    ///
    /// The second entry transition into the same state machine; callers are
    /// responsible for deduplicating gateway deliveries before invoking.
    pub async fn record_paid_order(&self, buyer_id: Uuid, line_items: Vec<LineItem>) -> Result<OrderReceipt> {
        self.validate_items(&line_items)?;

        self.commit_order(buyer_id, line_items, OrderStatus::Paid, PaymentStatus::Completed)
            .await
    }

    /// The single commit path: reserve → append → publish
    async fn commit_order(
        &self,
        buyer_id: Uuid,
        line_items: Vec<LineItem>,
        status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> Result<OrderReceipt> {
        self.stock.reserve_all(&line_items)?;

        let order_id = Uuid::now_v7();
        let now = Utc::now();
        let total = ledger_core::line_items_total(&line_items);

        let record = TransactionRecord {
            order_id,
            buyer_id,
            line_items: line_items.clone(),
            total,
            timestamp_nanos: now.timestamp_nanos_opt().unwrap_or(0),
        };

        let entry = match self.ledger.append(record).await {
            Ok(entry) => entry,
            Err(e) => {
                // Reservation must not survive a failed commit
                self.stock.release_all(&line_items);
                tracing::error!(order_id = %order_id, error = %e, "Ledger append failed, reservations released");
                return Err(Error::Ledger(e));
            }
        };

        let order = Order {
            order_id,
            buyer_id,
            line_items,
            total,
            status,
            payment_status,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(order_id, order);

        tracing::info!(
            order_id = %order_id,
            buyer_id = %buyer_id,
            total = %total,
            status = ?status,
            chain_hash = %entry.current_hash,
            "Order committed"
        );

        Ok(OrderReceipt {
            order_id,
            chain_hash: entry.current_hash,
        })
    }

    /// Advance an order's fulfilment status
    ///
    /// The map guard is held across the check and the mutation, so the
    /// persisted status is re-read at the moment of the transition; a stale
    /// in-memory copy can never drive an illegal edge.
    pub fn update_status(&self, order_id: Uuid, new_status: OrderStatus, actor: Actor) -> Result<Order> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| Error::NotFound(format!("order {}", order_id)))?;

        authorize(&actor, &order, Requirement::LineItemOwner)?;

        if order.status == OrderStatus::Cancelled {
            return Err(Error::Conflict(format!(
                "order {} is cancelled and immutable",
                order_id
            )));
        }

        if !order.status.can_advance_to(new_status) {
            return Err(Error::Conflict(format!(
                "cannot move order {} from {:?} to {:?}",
                order_id, order.status, new_status
            )));
        }

        order.status = new_status;
        order.updated_at = Utc::now();

        tracing::info!(order_id = %order_id, status = ?new_status, "Order status advanced");

        Ok(order.clone())
    }

    /// Cancel a pending order and restore its stock
    ///
    /// Idempotent against client retries: cancelling an already-cancelled
    /// order is a no-op success.
    pub fn cancel_order(&self, order_id: Uuid, buyer_id: Uuid) -> Result<Order> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| Error::NotFound(format!("order {}", order_id)))?;

        if order.buyer_id != buyer_id {
            return Err(Error::Forbidden(format!(
                "buyer {} does not own order {}",
                buyer_id, order_id
            )));
        }

        if order.status == OrderStatus::Cancelled {
            return Ok(order.clone());
        }

        if order.status != OrderStatus::Pending {
            return Err(Error::Conflict(format!(
                "order {} is {:?}, only pending orders can be cancelled",
                order_id, order.status
            )));
        }

        self.stock.release_all(&order.line_items);
        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();

        tracing::info!(order_id = %order_id, "Order cancelled, stock restored");

        Ok(order.clone())
    }

    /// Fetch one order; participant or admin only
    pub fn order(&self, order_id: Uuid, actor: Actor) -> Result<Order> {
        let order = self
            .orders
            .get(&order_id)
            .ok_or_else(|| Error::NotFound(format!("order {}", order_id)))?;

        authorize(&actor, &order, Requirement::Participant)?;

        Ok(order.clone())
    }

    /// All orders placed by one buyer
    pub fn orders_for_buyer(&self, buyer_id: Uuid) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.buyer_id == buyer_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    /// All orders containing one farmer's products
    pub fn orders_for_farmer(&self, farmer_id: Uuid) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.has_farmer(farmer_id))
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    /// Aggregate earnings and counts over one farmer's owned line items
    ///
    /// Cancelled orders are excluded; everything committed counts.
    pub fn farmer_stats(&self, farmer_id: Uuid) -> FarmerStats {
        let mut stats = FarmerStats::default();

        for order in self.orders.iter() {
            if order.status == OrderStatus::Cancelled {
                continue;
            }

            let mut owned = false;
            for item in order.line_items.iter().filter(|i| i.farmer_id == farmer_id) {
                owned = true;
                stats.units_sold += u64::from(item.quantity);
                stats.gross_earnings += item.subtotal();
            }
            if owned {
                stats.order_count += 1;
            }
        }

        stats
    }

    /// Number of orders held
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn validate_items(&self, items: &[LineItem]) -> Result<()> {
        if items.is_empty() {
            return Err(Error::Validation("Order must contain line items".to_string()));
        }

        if items.iter().any(|item| item.quantity == 0) {
            return Err(Error::Validation(
                "Line item quantities must be positive".to_string(),
            ));
        }

        let total = ledger_core::line_items_total(items);
        if total <= Decimal::ZERO {
            return Err(Error::Validation("Order total must be positive".to_string()));
        }

        Ok(())
    }
}
