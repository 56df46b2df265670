//! Payment routes

use crate::{
    auth::AuthContext,
    error::ApiError,
    metrics::METRICS,
    routes::orders::CartItem,
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use order_engine::Role;
use reconciler::{CheckoutSession, ReconcileOutcome, SessionStatus};
use serde::Deserialize;
use uuid::Uuid;

/// Header carrying the gateway's hex Ed25519 signature over the raw body
const SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Body of POST /payments/create-session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Cart lines to check out
    pub items: Vec<CartItem>,
}

/// POST /payments/create-session - create a gateway checkout session
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CheckoutSession>, ApiError> {
    METRICS.http_requests_total.inc();
    auth.require_role(Role::Buyer)?;

    let cart: Vec<(Uuid, u32)> = request
        .items
        .iter()
        .map(|item| (item.product_id, item.quantity))
        .collect();

    let session = state
        .reconciler
        .create_session(auth.actor.user_id, &cart)
        .await?;

    Ok(Json(session))
}

/// POST /payments/webhook - asynchronous payment event from the gateway
///
/// Returns success for both fresh commits and recognized duplicates, so the
/// gateway never retry-storms a processed event. Signature and payload
/// failures are the only errors returned.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    METRICS.http_requests_total.inc();
    METRICS.webhook_events_total.inc();

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            METRICS.webhook_rejected_total.inc();
            ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("Missing {} header", SIGNATURE_HEADER),
            )
        })?;

    match state.reconciler.process_event(&body, signature).await {
        Ok(ReconcileOutcome::Committed {
            order_id,
            chain_hash,
        }) => Ok(Json(serde_json::json!({
            "status": "committed",
            "order_id": order_id,
            "chain_hash": chain_hash.to_hex(),
        }))),

        Ok(ReconcileOutcome::Duplicate { order_id }) => {
            METRICS.webhook_duplicates_total.inc();
            Ok(Json(serde_json::json!({
                "status": "duplicate",
                "order_id": order_id,
            })))
        }

        Err(e) => {
            if matches!(
                e,
                reconciler::Error::Signature(_) | reconciler::Error::Malformed(_)
            ) {
                METRICS.webhook_rejected_total.inc();
            }
            Err(e.into())
        }
    }
}

/// GET /payments/verify-session/:id - read-only status check
pub async fn verify_session(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatus>, ApiError> {
    METRICS.http_requests_total.inc();
    auth.require_role(Role::Buyer)?;

    let status = state.reconciler.verify_session(&session_id).await?;
    Ok(Json(status))
}
