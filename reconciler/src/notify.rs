//! Notification dispatch
//!
//! Notifications are fire-and-forget relative to the commit path: delivery
//! runs in detached tasks with bounded backoff retries, failures are logged
//! and never surfaced to the caller or used to roll back a committed
//! order or payment.

use crate::error::Result;
use async_trait::async_trait;
use order_engine::OrderStatus;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Messages the marketplace sends out
#[derive(Debug, Clone)]
pub enum Notification {
    /// Order confirmation to the buyer
    OrderConfirmation {
        /// Recipient buyer
        buyer_id: Uuid,
        /// Committed order
        order_id: Uuid,
    },

    /// Payment receipt to the buyer
    PaymentReceipt {
        /// Recipient buyer
        buyer_id: Uuid,
        /// Paid order
        order_id: Uuid,
        /// Amount charged
        amount: Decimal,
    },

    /// New-order alert to a farmer with items in the order
    NewOrder {
        /// Recipient farmer
        farmer_id: Uuid,
        /// Committed order
        order_id: Uuid,
    },

    /// Status change alert to the buyer
    StatusUpdate {
        /// Recipient buyer
        buyer_id: Uuid,
        /// Affected order
        order_id: Uuid,
        /// New status
        status: OrderStatus,
    },
}

/// Notification delivery collaborator
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    async fn send(&self, notification: Notification) -> Result<()>;
}

/// Notifier that logs deliveries via tracing
///
/// Stands in for the external notification service in tests and local runs.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, notification: Notification) -> Result<()> {
        tracing::info!(notification = ?notification, "Notification delivered");
        Ok(())
    }
}

/// Delivery attempts per notification
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff between attempts; doubles each retry
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Dispatch notifications without blocking the commit path
pub fn dispatch(notifier: Arc<dyn Notifier>, notifications: Vec<Notification>) {
    for notification in notifications {
        let notifier = notifier.clone();
        tokio::spawn(async move {
            deliver_with_retry(notifier, notification).await;
        });
    }
}

async fn deliver_with_retry(notifier: Arc<dyn Notifier>, notification: Notification) {
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=MAX_ATTEMPTS {
        match notifier.send(notification.clone()).await {
            Ok(()) => return,
            Err(e) if attempt < MAX_ATTEMPTS => {
                tracing::debug!(
                    attempt,
                    error = %e,
                    "Notification attempt failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => {
                tracing::warn!(
                    notification = ?notification,
                    error = %e,
                    "Notification dropped after {} attempts",
                    MAX_ATTEMPTS
                );
            }
        }
    }
}
