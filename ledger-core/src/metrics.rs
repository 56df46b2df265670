//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `ledger_appends_total` - Total number of entries appended
//! - `ledger_append_duration_seconds` - Histogram of append latencies
//! - `ledger_verify_runs_total` - Total chain verification walks
//! - `ledger_verify_failures_total` - Verification walks that found tampering

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total entries appended
    pub appends_total: IntCounter,

    /// Append duration histogram
    pub append_duration: Histogram,

    /// Total chain verification walks
    pub verify_runs_total: IntCounter,

    /// Verification walks that detected tampering
    pub verify_failures_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let appends_total = IntCounter::with_opts(Opts::new(
            "ledger_appends_total",
            "Total number of entries appended",
        ))?;
        registry.register(Box::new(appends_total.clone()))?;

        let append_duration = Histogram::with_opts(HistogramOpts::new(
            "ledger_append_duration_seconds",
            "Histogram of append latencies",
        ))?;
        registry.register(Box::new(append_duration.clone()))?;

        let verify_runs_total = IntCounter::with_opts(Opts::new(
            "ledger_verify_runs_total",
            "Total chain verification walks",
        ))?;
        registry.register(Box::new(verify_runs_total.clone()))?;

        let verify_failures_total = IntCounter::with_opts(Opts::new(
            "ledger_verify_failures_total",
            "Verification walks that found tampering",
        ))?;
        registry.register(Box::new(verify_failures_total.clone()))?;

        Ok(Self {
            appends_total,
            append_duration,
            verify_runs_total,
            verify_failures_total,
            registry,
        })
    }
}
