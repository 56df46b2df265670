//! Order routes

use crate::{auth::AuthContext, error::ApiError, metrics::METRICS, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use order_engine::{FarmerStats, Order, OrderReceipt, OrderStatus, Role};
use reconciler::{notify, Notification};
use serde::Deserialize;
use uuid::Uuid;

/// One cart line: product and quantity
#[derive(Debug, Deserialize)]
pub struct CartItem {
    /// Product to purchase
    pub product_id: Uuid,
    /// Units to purchase
    pub quantity: u32,
}

fn to_cart(items: &[CartItem]) -> Vec<(Uuid, u32)> {
    items.iter().map(|i| (i.product_id, i.quantity)).collect()
}

/// Body of POST /orders
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Cart lines
    pub items: Vec<CartItem>,
}

/// POST /orders - create a pending order from a cart
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderReceipt>), ApiError> {
    METRICS.http_requests_total.inc();
    auth.require_role(Role::Buyer)?;

    let line_items = state.manager.stock().resolve_items(&to_cart(&request.items))?;
    let receipt = state
        .manager
        .create_order(auth.actor.user_id, line_items)
        .await?;

    METRICS.orders_created_total.inc();

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /orders/my - list own orders
///
/// Buyers see orders they placed; farmers see orders containing their
/// products.
pub async fn my_orders(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<Order>>, ApiError> {
    METRICS.http_requests_total.inc();

    let orders = match auth.actor.role {
        Role::Farmer => state.manager.orders_for_farmer(auth.actor.user_id),
        Role::Buyer | Role::Admin => state.manager.orders_for_buyer(auth.actor.user_id),
    };

    Ok(Json(orders))
}

/// GET /orders/:id - fetch one order (participant or admin)
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    METRICS.http_requests_total.inc();

    let order = state.manager.order(order_id, auth.actor)?;
    Ok(Json(order))
}

/// Body of PATCH /orders/:id/status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status (must be forward-reachable)
    pub status: OrderStatus,
}

/// PATCH /orders/:id/status - advance fulfilment status
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    METRICS.http_requests_total.inc();

    let order = state
        .manager
        .update_status(order_id, request.status, auth.actor)?;

    // Fire-and-forget; a failed notification never affects the transition
    notify::dispatch(
        state.reconciler.notifier(),
        vec![Notification::StatusUpdate {
            buyer_id: order.buyer_id,
            order_id: order.order_id,
            status: order.status,
        }],
    );

    Ok(Json(order))
}

/// POST /orders/:id/cancel - cancel a pending order
pub async fn cancel_order(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    METRICS.http_requests_total.inc();
    auth.require_role(Role::Buyer)?;

    let order = state.manager.cancel_order(order_id, auth.actor.user_id)?;
    METRICS.orders_cancelled_total.inc();

    Ok(Json(order))
}

/// GET /orders/farmer/stats - aggregate earnings over owned line items
pub async fn farmer_stats(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<FarmerStats>, ApiError> {
    METRICS.http_requests_total.inc();
    auth.require_role(Role::Farmer)?;

    Ok(Json(state.manager.farmer_stats(auth.actor.user_id)))
}
