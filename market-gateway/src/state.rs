//! Shared application state

use crate::auth::AuthResolver;
use order_engine::OrderManager;
use reconciler::PaymentReconciler;
use std::sync::Arc;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Order lifecycle manager (sole writer to stock and ledger)
    pub manager: Arc<OrderManager>,

    /// Payment reconciler
    pub reconciler: Arc<PaymentReconciler>,

    /// Bearer-token resolution collaborator
    pub auth: Arc<dyn AuthResolver>,
}
