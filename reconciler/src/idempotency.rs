//! Idempotency guard for gateway deliveries
//!
//! The gateway delivers events at least once; this guard recognizes repeat
//! deliveries by their external session id. Claiming is atomic (a single
//! DashMap entry operation), so two deliveries of the same session can
//! never both proceed to commit.

use crate::types::PaymentRecord;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Slot state for one session id
#[derive(Debug, Clone)]
enum Slot {
    /// A delivery claimed this session and is still processing
    InFlight,
    /// Processing finished; the record is retained for duplicate replies
    Completed(PaymentRecord),
}

/// Outcome of attempting to claim a session id
#[derive(Debug, Clone)]
pub enum Claim {
    /// Fresh session; the caller now owns processing
    Accepted,
    /// Session already processed; reply with the retained record
    Duplicate(PaymentRecord),
    /// Another delivery is mid-processing
    InFlight,
}

/// Deduplicates externally-triggered events by external session id
#[derive(Default)]
pub struct IdempotencyGuard {
    slots: DashMap<String, Slot>,
}

impl IdempotencyGuard {
    /// Create an empty guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim a session id
    pub fn claim(&self, session_id: &str) -> Claim {
        match self.slots.entry(session_id.to_string()) {
            Entry::Occupied(occupied) => match occupied.get() {
                Slot::Completed(record) => Claim::Duplicate(record.clone()),
                Slot::InFlight => Claim::InFlight,
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::InFlight);
                Claim::Accepted
            }
        }
    }

    /// Mark a claimed session as processed
    pub fn complete(&self, session_id: &str, record: PaymentRecord) {
        self.slots
            .insert(session_id.to_string(), Slot::Completed(record));
    }

    /// Release a claim whose processing failed
    ///
    /// Only an in-flight claim is removed; a completed record is never
    /// discarded.
    pub fn abandon(&self, session_id: &str) {
        if let Entry::Occupied(occupied) = self.slots.entry(session_id.to_string()) {
            if matches!(occupied.get(), Slot::InFlight) {
                occupied.remove();
            }
        }
    }

    /// Retained record for a session, if processed
    pub fn record(&self, session_id: &str) -> Option<PaymentRecord> {
        self.slots.get(session_id).and_then(|slot| match slot.value() {
            Slot::Completed(record) => Some(record.clone()),
            Slot::InFlight => None,
        })
    }

    /// Number of sessions tracked (in flight or completed)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check for an empty guard
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
