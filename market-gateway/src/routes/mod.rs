//! HTTP route handlers

pub mod orders;
pub mod payments;

use crate::{error::ApiError, metrics::METRICS, state::AppState};
use axum::{extract::State, Json};

/// GET /health - service health and chain statistics
pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let tail = state
        .manager
        .ledger()
        .tail()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "market-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "orders": state.manager.order_count(),
        "chain_entries": tail.next_sequence,
        "chain_tail": tail.tail_hash.to_hex(),
    })))
}

/// GET /metrics - Prometheus text-format export (gateway + ledger)
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, ApiError> {
    let ledger_registry = state.manager.ledger().metrics_registry();

    METRICS
        .export(std::slice::from_ref(ledger_registry.as_ref()))
        .map_err(|e| ApiError::internal(format!("Failed to export metrics: {}", e)))
}
