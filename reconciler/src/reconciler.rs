//! Payment reconciliation
//!
//! Consumes asynchronous, at-least-once-delivered gateway events and drives
//! the order manager exactly once per external transaction. Verification
//! happens before any side effect; the idempotency guard makes duplicate
//! deliveries a safe no-op.

use crate::{
    error::{Error, Result},
    gateway::PaymentGateway,
    idempotency::{Claim, IdempotencyGuard},
    notify::{self, Notification, Notifier},
    signature::SignatureVerifier,
    types::{CheckoutEvent, CheckoutSession, PaymentRecord, ReconcileOutcome, SessionStatus},
};
use chrono::Utc;
use order_engine::{OrderManager, PaymentStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default deadline for read-only gateway queries
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives order commits from verified gateway events
pub struct PaymentReconciler {
    verifier: SignatureVerifier,
    guard: IdempotencyGuard,
    manager: Arc<OrderManager>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    gateway_timeout: Duration,
}

impl PaymentReconciler {
    /// Create a reconciler over the shared order manager
    pub fn new(
        verifier: SignatureVerifier,
        manager: Arc<OrderManager>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            verifier,
            guard: IdempotencyGuard::new(),
            manager,
            gateway,
            notifier,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Override the gateway query deadline
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Notifier shared with the HTTP layer for status-update messages
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }

    /// Process one webhook delivery
    ///
    /// The signature is checked over the raw payload before anything else;
    /// an unverifiable event causes no side effects. Duplicate deliveries
    /// (same session id) return success without reprocessing.
    pub async fn process_event(
        &self,
        payload: &[u8],
        signature_hex: &str,
    ) -> Result<ReconcileOutcome> {
        self.verifier.verify(payload, signature_hex)?;

        let event: CheckoutEvent = serde_json::from_slice(payload)
            .map_err(|e| Error::Malformed(format!("Invalid event payload: {}", e)))?;

        let expected = ledger_core::line_items_total(&event.line_items);
        if event.amount != expected {
            return Err(Error::Malformed(format!(
                "Amount {} does not match line items (expected {})",
                event.amount, expected
            )));
        }

        match self.guard.claim(&event.session_id) {
            Claim::Duplicate(record) => {
                tracing::info!(
                    session_id = %event.session_id,
                    order_id = %record.order_id,
                    "Duplicate gateway delivery ignored"
                );
                return Ok(ReconcileOutcome::Duplicate {
                    order_id: record.order_id,
                });
            }
            Claim::InFlight => {
                return Err(Error::ConcurrentDelivery(event.session_id));
            }
            Claim::Accepted => {}
        }

        let receipt = match self
            .manager
            .record_paid_order(event.buyer_id, event.line_items.clone())
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                // Release the claim so a redelivery can retry the commit
                self.guard.abandon(&event.session_id);
                return Err(Error::Order(e));
            }
        };

        let record = PaymentRecord {
            order_id: receipt.order_id,
            session_id: event.session_id.clone(),
            amount: event.amount,
            status: PaymentStatus::Completed,
            transaction_id: event.transaction_id.clone(),
            created_at: Utc::now(),
        };
        self.guard.complete(&event.session_id, record);

        tracing::info!(
            session_id = %event.session_id,
            order_id = %receipt.order_id,
            amount = %event.amount,
            "Payment reconciled"
        );

        notify::dispatch(self.notifier.clone(), self.notifications_for(&event, receipt.order_id));

        Ok(ReconcileOutcome::Committed {
            order_id: receipt.order_id,
            chain_hash: receipt.chain_hash,
        })
    }

    /// Create a checkout session for a buyer's cart
    pub async fn create_session(
        &self,
        buyer_id: Uuid,
        cart: &[(Uuid, u32)],
    ) -> Result<CheckoutSession> {
        let line_items = self.manager.stock().resolve_items(cart)?;
        let amount = ledger_core::line_items_total(&line_items);

        self.gateway
            .create_session(buyer_id, &line_items, amount)
            .await
    }

    /// Read-only session query against the gateway
    ///
    /// No side effects; safe to call any number of times. Fails closed on
    /// the configured deadline.
    pub async fn verify_session(&self, session_id: &str) -> Result<SessionStatus> {
        tokio::time::timeout(self.gateway_timeout, self.gateway.fetch_session(session_id))
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "gateway query for session {} exceeded {}ms",
                    session_id,
                    self.gateway_timeout.as_millis()
                ))
            })?
    }

    /// Retained payment record for a session, if reconciled
    pub fn payment_record(&self, session_id: &str) -> Option<PaymentRecord> {
        self.guard.record(session_id)
    }

    fn notifications_for(&self, event: &CheckoutEvent, order_id: Uuid) -> Vec<Notification> {
        let mut notifications = vec![
            Notification::PaymentReceipt {
                buyer_id: event.buyer_id,
                order_id,
                amount: event.amount,
            },
            Notification::OrderConfirmation {
                buyer_id: event.buyer_id,
                order_id,
            },
        ];

        let farmers: HashSet<Uuid> = event.line_items.iter().map(|i| i.farmer_id).collect();
        notifications.extend(
            farmers
                .into_iter()
                .map(|farmer_id| Notification::NewOrder { farmer_id, order_id }),
        );

        notifications
    }
}
