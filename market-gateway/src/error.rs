//! HTTP error mapping
//!
//! One error type at the edge; every domain error maps onto the taxonomy's
//! status code and a JSON `{error, timestamp}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

/// API-level error carrying the mapped status code
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status the taxonomy maps this error to
    pub status: StatusCode,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Build from status and message
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Missing or unresolvable bearer token
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Missing or invalid bearer token")
    }

    /// Actor's role does not permit the operation
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Internal failure the client cannot act on
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }

        (
            self.status,
            Json(serde_json::json!({
                "error": self.message,
                "timestamp": Utc::now(),
            })),
        )
            .into_response()
    }
}

impl From<order_engine::Error> for ApiError {
    fn from(err: order_engine::Error) -> Self {
        use order_engine::Error::*;

        let status = match &err {
            Validation(_) => StatusCode::BAD_REQUEST,
            InsufficientStock { .. } => StatusCode::CONFLICT,
            NotFound(_) => StatusCode::NOT_FOUND,
            Forbidden(_) => StatusCode::FORBIDDEN,
            Conflict(_) => StatusCode::CONFLICT,
            Ledger(_) | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self::new(status, err.to_string())
    }
}

impl From<reconciler::Error> for ApiError {
    fn from(err: reconciler::Error) -> Self {
        use reconciler::Error::*;

        match err {
            Order(inner) => inner.into(),
            Signature(_) | Malformed(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            ConcurrentDelivery(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            SessionNotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            Gateway(_) => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
            Timeout(_) => Self::new(StatusCode::GATEWAY_TIMEOUT, err.to_string()),
            Notification(_) => Self::internal(err.to_string()),
        }
    }
}
