//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for money)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// SHA-256 digest linking ledger entries into a chain
///
/// Serializes as 64 hex chars in human-readable formats (JSON) and as raw
/// bytes in compact formats (bincode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHash([u8; 32]);

impl Serialize for ChainHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ChainHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChainHashVisitor;

        impl serde::de::Visitor<'_> for ChainHashVisitor {
            type Value = ChainHash;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a 32-byte digest or 64 hex chars")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ChainHash, E> {
                ChainHash::from_hex(v).ok_or_else(|| E::custom("invalid hex digest"))
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<ChainHash, E> {
                let digest: [u8; 32] = v
                    .try_into()
                    .map_err(|_| E::custom("digest must be 32 bytes"))?;
                Ok(ChainHash(digest))
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(ChainHashVisitor)
        } else {
            deserializer.deserialize_bytes(ChainHashVisitor)
        }
    }
}

impl ChainHash {
    /// Genesis sentinel: the all-zero hash (64 zeros in hex)
    pub const GENESIS: ChainHash = ChainHash([0u8; 32]);

    /// Create from raw digest bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as 64 lowercase hex chars
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from 64 hex chars
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let digest: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(digest))
    }

    /// Check for the genesis sentinel
    pub fn is_genesis(&self) -> bool {
        *self == Self::GENESIS
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One purchased product line within an order
///
/// Line items are immutable once the order is committed; they are part of
/// the canonical ledger payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product being purchased
    pub product_id: Uuid,

    /// Product title at time of purchase
    pub title: String,

    /// Units purchased (always > 0 for committed orders)
    pub quantity: u32,

    /// Price per unit at time of purchase (exact decimal)
    pub unit_price: Decimal,

    /// Farmer who owns the product
    pub farmer_id: Uuid,
}

impl LineItem {
    /// Line subtotal: quantity × unit price
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// Sum of quantity × unit price over a set of line items
pub fn line_items_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::subtotal).sum()
}

/// Canonical payload of one committed transaction
///
/// The chain digest is computed over these fields and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Order this transaction commits
    pub order_id: Uuid,

    /// Buyer who placed the order
    pub buyer_id: Uuid,

    /// Purchased line items
    pub line_items: Vec<LineItem>,

    /// Order total (must equal Σ quantity × unit price)
    pub total: Decimal,

    /// Commit timestamp (nanoseconds since Unix epoch)
    pub timestamp_nanos: i64,
}

impl TransactionRecord {
    /// Canonical bytes for hashing
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Deterministic serialization; field order is fixed by the struct
        bincode::serialize(self).expect("serialization cannot fail")
    }

    /// Expected total derived from the line items
    pub fn expected_total(&self) -> Decimal {
        line_items_total(&self.line_items)
    }
}

/// One entry in the append-only hash chain
///
/// Entries are never mutated after append. For every n > 0,
/// `entry[n].previous_hash == entry[n-1].current_hash`; entry 0 links to the
/// genesis sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the chain (0-based, strictly sequential)
    pub sequence: u64,

    /// Canonical transaction payload
    pub record: TransactionRecord,

    /// Digest of the previous entry (genesis sentinel for entry 0)
    pub previous_hash: ChainHash,

    /// Digest over this entry's canonical payload
    pub current_hash: ChainHash,
}

/// Current chain tail as seen by the single writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTail {
    /// Sequence the next append will receive
    pub next_sequence: u64,

    /// Digest of the most recent entry (genesis sentinel when empty)
    pub tail_hash: ChainHash,
}

impl ChainTail {
    /// Tail of an empty chain
    pub fn empty() -> Self {
        Self {
            next_sequence: 0,
            tail_hash: ChainHash::GENESIS,
        }
    }
}
