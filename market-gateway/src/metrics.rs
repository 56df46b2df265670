//! Prometheus metrics for the HTTP gateway
//!
//! Tracks request throughput, order commits, and webhook outcomes. The
//! ledger keeps its own registry; the /metrics endpoint exports both.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

/// Gateway metrics
pub struct Metrics {
    /// Registry backing the /metrics endpoint
    pub registry: Registry,

    /// Total HTTP requests handled
    pub http_requests_total: IntCounter,

    /// Orders committed through POST /orders
    pub orders_created_total: IntCounter,

    /// Orders cancelled through POST /orders/:id/cancel
    pub orders_cancelled_total: IntCounter,

    /// Webhook deliveries processed
    pub webhook_events_total: IntCounter,

    /// Webhook deliveries recognized as duplicates
    pub webhook_duplicates_total: IntCounter,

    /// Webhook deliveries rejected (signature or payload)
    pub webhook_rejected_total: IntCounter,
}

impl Metrics {
    fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounter::with_opts(Opts::new(
            "gateway_http_requests_total",
            "Total HTTP requests handled",
        ))?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let orders_created_total = IntCounter::with_opts(Opts::new(
            "gateway_orders_created_total",
            "Orders committed through the orders endpoint",
        ))?;
        registry.register(Box::new(orders_created_total.clone()))?;

        let orders_cancelled_total = IntCounter::with_opts(Opts::new(
            "gateway_orders_cancelled_total",
            "Orders cancelled by buyers",
        ))?;
        registry.register(Box::new(orders_cancelled_total.clone()))?;

        let webhook_events_total = IntCounter::with_opts(Opts::new(
            "gateway_webhook_events_total",
            "Webhook deliveries processed",
        ))?;
        registry.register(Box::new(webhook_events_total.clone()))?;

        let webhook_duplicates_total = IntCounter::with_opts(Opts::new(
            "gateway_webhook_duplicates_total",
            "Webhook deliveries recognized as duplicates",
        ))?;
        registry.register(Box::new(webhook_duplicates_total.clone()))?;

        let webhook_rejected_total = IntCounter::with_opts(Opts::new(
            "gateway_webhook_rejected_total",
            "Webhook deliveries rejected before processing",
        ))?;
        registry.register(Box::new(webhook_rejected_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            orders_created_total,
            orders_cancelled_total,
            webhook_events_total,
            webhook_duplicates_total,
            webhook_rejected_total,
        })
    }

    /// Export this registry plus any extra registries in text format
    pub fn export(&self, extra: &[Registry]) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder.encode(&self.registry.gather(), &mut buffer)?;
        for registry in extra {
            encoder.encode(&registry.gather(), &mut buffer)?;
        }

        Ok(String::from_utf8(buffer)?)
    }
}

/// Global gateway metrics
pub static METRICS: Lazy<Metrics> = Lazy::new(|| Metrics::new().expect("metrics init cannot fail"));
