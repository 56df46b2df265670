//! Payment gateway collaborator
//!
//! The gateway is external: it hosts checkout, collects payment, and calls
//! back over the webhook. This module defines the seam plus an in-process
//! stand-in used by tests and local runs.

use crate::{
    error::{Error, Result},
    types::{CheckoutSession, SessionStatus},
};
use async_trait::async_trait;
use dashmap::DashMap;
use order_engine::LineItem;
use rust_decimal::Decimal;
use uuid::Uuid;

/// External payment gateway operations
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout session for a cart
    async fn create_session(
        &self,
        buyer_id: Uuid,
        line_items: &[LineItem],
        amount: Decimal,
    ) -> Result<CheckoutSession>;

    /// Retrieve session state; read-only, safe to call any number of times
    async fn fetch_session(&self, session_id: &str) -> Result<SessionStatus>;
}

/// In-process gateway stand-in
///
/// Sessions live in memory; `mark_paid` simulates the buyer completing
/// checkout.
#[derive(Default)]
pub struct InProcessGateway {
    sessions: DashMap<String, SessionStatus>,
}

impl InProcessGateway {
    /// Create an empty gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the buyer completing checkout for a session
    pub fn mark_paid(&self, session_id: &str, transaction_id: &str) -> Result<()> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        session.paid = true;
        session.transaction_id = Some(transaction_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for InProcessGateway {
    async fn create_session(
        &self,
        buyer_id: Uuid,
        _line_items: &[LineItem],
        amount: Decimal,
    ) -> Result<CheckoutSession> {
        let session_id = format!("cs_{}", Uuid::new_v4().simple());
        let session = CheckoutSession {
            session_id: session_id.clone(),
            checkout_url: format!("https://checkout.invalid/{}", session_id),
            amount,
        };

        self.sessions.insert(
            session_id.clone(),
            SessionStatus {
                session_id,
                paid: false,
                amount,
                transaction_id: None,
            },
        );

        tracing::debug!(buyer_id = %buyer_id, amount = %amount, "Checkout session created");

        Ok(session)
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionStatus> {
        self.sessions
            .get(session_id)
            .map(|s| s.value().clone())
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }
}
