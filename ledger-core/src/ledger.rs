//! Main ledger orchestration layer
//!
//! This module ties together storage, crypto, and actor components
//! into a high-level API for committing marketplace transactions.
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{Config, Ledger};
//!
//! #[tokio::main]
//! async fn main() -> ledger_core::Result<()> {
//!     let config = Config::default();
//!     let ledger = Ledger::open(config)?;
//!
//!     // Commit a transaction
//!     // let entry = ledger.append(record).await?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    metrics::Metrics,
    types::{ChainTail, LedgerEntry, TransactionRecord},
    Config, Error, Result, Storage,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Main ledger interface
pub struct Ledger {
    /// Actor handle for appends and linearized verification
    handle: LedgerHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Append deadline
    append_timeout: Duration,

    /// Prometheus metrics
    metrics: Metrics,
}

impl Ledger {
    /// Open ledger with configuration
    pub fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let handle = spawn_ledger_actor(storage.clone())?;

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to register metrics: {}", e)))?;

        Ok(Self {
            handle,
            storage,
            append_timeout: Duration::from_millis(config.append_timeout_ms),
            metrics,
        })
    }

    /// Commit a transaction to the chain
    ///
    /// Validates the record, then appends via the single-writer actor behind
    /// the configured deadline. A timed-out append fails closed: the caller
    /// must treat the transaction as not committed and compensate.
    pub async fn append(&self, record: TransactionRecord) -> Result<LedgerEntry> {
        self.validate_record(&record)?;

        let timer = self.metrics.append_duration.start_timer();
        let result = tokio::time::timeout(self.append_timeout, self.handle.append(record)).await;
        timer.observe_duration();

        match result {
            Ok(Ok(entry)) => {
                self.metrics.appends_total.inc();
                Ok(entry)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Timeout(format!(
                "append exceeded {}ms",
                self.append_timeout.as_millis()
            ))),
        }
    }

    /// Get entry by sequence
    pub fn entry(&self, sequence: u64) -> Result<LedgerEntry> {
        self.storage.entry(sequence)
    }

    /// Get entries committed for one order
    pub fn entries_for_order(&self, order_id: Uuid) -> Result<Vec<LedgerEntry>> {
        self.storage.entries_for_order(order_id)
    }

    /// Get the current chain tail
    pub async fn tail(&self) -> Result<ChainTail> {
        self.handle.tail().await
    }

    /// Verify the full chain from genesis
    ///
    /// Returns the number of entries verified; fails `TamperDetected` at the
    /// first entry whose linkage or payload digest does not hold.
    pub async fn verify_chain(&self) -> Result<u64> {
        self.metrics.verify_runs_total.inc();
        let result = self.handle.verify_chain().await;
        if matches!(result, Err(Error::TamperDetected { .. })) {
            self.metrics.verify_failures_total.inc();
        }
        result
    }

    /// Prometheus registry for this ledger's metrics
    pub fn metrics_registry(&self) -> Arc<prometheus::Registry> {
        self.metrics.registry.clone()
    }

    /// Shutdown ledger
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }

    /// Validate record invariants
    fn validate_record(&self, record: &TransactionRecord) -> Result<()> {
        if record.line_items.is_empty() {
            return Err(Error::InvalidRecord("Line items must not be empty".to_string()));
        }

        if record.line_items.iter().any(|item| item.quantity == 0) {
            return Err(Error::InvalidRecord(
                "Line item quantities must be positive".to_string(),
            ));
        }

        if record.total <= Decimal::ZERO {
            return Err(Error::InvalidRecord("Total must be positive".to_string()));
        }

        if record.total != record.expected_total() {
            return Err(Error::InvalidRecord(format!(
                "Total {} does not match line items (expected {})",
                record.total,
                record.expected_total()
            )));
        }

        // Check timestamp is not in future (allow 60s clock skew)
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        if record.timestamp_nanos > now + 60_000_000_000 {
            return Err(Error::InvalidRecord(
                "Timestamp is in the future".to_string(),
            ));
        }

        Ok(())
    }
}
