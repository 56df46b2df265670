//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! one logical writer task owns the chain tail, so reading the tail and
//! appending the next entry can never interleave across concurrent orders.
//! Without this discipline two orders could both read the same tail and
//! fork the chain.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │           Order engine / payment reconciler           │
//! │              Many concurrent tasks                    │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ LedgerHandle (Clone)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │  next_sequence / tail_hash held in actor state       │
//! │  hash → link → Storage::put_entry (atomic batch)     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Chain verification also runs on the actor task, so a verify walk never
//! observes a half-applied append.

use crate::crypto::hash_record;
use crate::types::{ChainHash, ChainTail, LedgerEntry, TransactionRecord};
use crate::{Error, Result, Storage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Append a new transaction to the chain
    Append {
        /// Canonical payload to commit
        record: TransactionRecord,
        /// Committed entry, with its chain linkage
        response: oneshot::Sender<Result<LedgerEntry>>,
    },

    /// Get the current chain tail
    Tail {
        /// Tail snapshot
        response: oneshot::Sender<ChainTail>,
    },

    /// Verify the full chain from genesis
    VerifyChain {
        /// Number of entries verified
        response: oneshot::Sender<Result<u64>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
pub struct LedgerActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Sequence the next append will receive
    next_sequence: u64,

    /// Digest of the most recent entry
    tail_hash: ChainHash,
}

impl LedgerActor {
    /// Create new actor with a recovered tail
    pub fn new(
        storage: Arc<Storage>,
        mailbox: mpsc::Receiver<LedgerMessage>,
        tail: ChainTail,
    ) -> Self {
        Self {
            storage,
            mailbox,
            next_sequence: tail.next_sequence,
            tail_hash: tail.tail_hash,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => break,
                _ => self.handle_message(msg),
            }
        }
    }

    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::Append { record, response } => {
                let _ = response.send(self.append(record));
            }

            LedgerMessage::Tail { response } => {
                let _ = response.send(ChainTail {
                    next_sequence: self.next_sequence,
                    tail_hash: self.tail_hash,
                });
            }

            LedgerMessage::VerifyChain { response } => {
                let _ = response.send(self.verify_chain());
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    /// Hash, link, and durably write one entry
    ///
    /// The cached tail only advances after the storage write succeeds, so a
    /// failed append leaves the chain untouched.
    fn append(&mut self, record: TransactionRecord) -> Result<LedgerEntry> {
        let entry = LedgerEntry {
            sequence: self.next_sequence,
            current_hash: hash_record(&record),
            previous_hash: self.tail_hash,
            record,
        };

        self.storage.put_entry(&entry)?;

        self.next_sequence = entry.sequence + 1;
        self.tail_hash = entry.current_hash;

        Ok(entry)
    }

    /// Walk the chain from genesis, checking linkage and payload digests
    fn verify_chain(&self) -> Result<u64> {
        let mut expected_previous = ChainHash::GENESIS;
        let mut expected_sequence = 0u64;

        self.storage.for_each_entry(|entry| {
            if entry.sequence != expected_sequence {
                return Err(Error::TamperDetected {
                    sequence: expected_sequence,
                    reason: format!("missing entry, found sequence {}", entry.sequence),
                });
            }

            if entry.previous_hash != expected_previous {
                return Err(Error::TamperDetected {
                    sequence: entry.sequence,
                    reason: "previous_hash does not match predecessor digest".to_string(),
                });
            }

            if hash_record(&entry.record) != entry.current_hash {
                return Err(Error::TamperDetected {
                    sequence: entry.sequence,
                    reason: "current_hash does not match payload".to_string(),
                });
            }

            expected_previous = entry.current_hash;
            expected_sequence = entry.sequence + 1;
            Ok(())
        })?;

        Ok(expected_sequence)
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Append a transaction
    pub async fn append(&self, record: TransactionRecord) -> Result<LedgerEntry> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Append {
                record,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Get the current chain tail
    pub async fn tail(&self) -> Result<ChainTail> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Tail { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Verify the full chain; returns the number of entries verified
    pub async fn verify_chain(&self) -> Result<u64> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::VerifyChain { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor, recovering the tail from storage
pub fn spawn_ledger_actor(storage: Arc<Storage>) -> Result<LedgerHandle> {
    let tail = match storage.latest_entry()? {
        Some(entry) => ChainTail {
            next_sequence: entry.sequence + 1,
            tail_hash: entry.current_hash,
        },
        None => ChainTail::empty(),
    };

    tracing::info!(
        next_sequence = tail.next_sequence,
        tail_hash = %tail.tail_hash,
        "Ledger actor recovered chain tail"
    );

    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = LedgerActor::new(storage, rx, tail);

    tokio::spawn(async move {
        actor.run().await;
    });

    Ok(LedgerHandle::new(tx))
}
