//! HarvestRail Market Gateway
//!
//! HTTP surface over the order engine and payment reconciler: JSON routes,
//! bearer-token auth resolution, error-taxonomy status mapping, health and
//! Prometheus metrics endpoints.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::{AuthContext, AuthResolver, StaticTokenResolver};
pub use config::GatewayConfig;
pub use error::ApiError;
pub use state::AppState;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Build the gateway router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics_handler))
        .route("/orders", post(routes::orders::create_order))
        .route("/orders/my", get(routes::orders::my_orders))
        .route("/orders/farmer/stats", get(routes::orders::farmer_stats))
        .route("/orders/:id", get(routes::orders::get_order))
        .route("/orders/:id/status", patch(routes::orders::update_status))
        .route("/orders/:id/cancel", post(routes::orders::cancel_order))
        .route("/payments/create-session", post(routes::payments::create_session))
        .route("/payments/webhook", post(routes::payments::webhook))
        .route(
            "/payments/verify-session/:id",
            get(routes::payments::verify_session),
        )
        .layer(cors)
        .with_state(state)
}
