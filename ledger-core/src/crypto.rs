//! Cryptographic operations for the ledger
//!
//! SHA-256 hashing of canonical transaction payloads. The chain links each
//! entry to the digest of its predecessor; the first entry links to the
//! all-zero genesis sentinel.

use crate::types::{ChainHash, TransactionRecord};
use sha2::{Digest, Sha256};

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> ChainHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    ChainHash::from_bytes(hasher.finalize().into())
}

/// Hash a transaction record
///
/// Creates a deterministic 32-byte digest from the record's canonical bytes.
pub fn hash_record(record: &TransactionRecord) -> ChainHash {
    hash_bytes(&record.canonical_bytes())
}
