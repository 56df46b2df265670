//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `entries` - Append-only hash chain (key: big-endian sequence)
//! - `order_index` - Secondary index (key: order_id || sequence)
//!
//! Sequence keys are big-endian so RocksDB's default byte ordering matches
//! chain order; iterating `entries` from the start walks the chain from
//! genesis.

use crate::{
    error::{Error, Result},
    types::LedgerEntry,
    Config,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_ENTRIES: &str = "entries";
const CF_ORDER_INDEX: &str = "order_index";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for append-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ENTRIES, Self::cf_options_entries()),
            ColumnFamilyDescriptor::new(CF_ORDER_INDEX, Self::cf_options_order_index()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_entries() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_order_index() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Append entry with its order index as a single atomic write
    ///
    /// Callers are responsible for sequence discipline; the single-writer
    /// actor is the only component that appends in production. Writing an
    /// existing sequence overwrites it, which the tamper-detection tests
    /// exploit deliberately.
    pub fn put_entry(&self, entry: &LedgerEntry) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_entries = self.cf_handle(CF_ENTRIES)?;
        let value = bincode::serialize(entry)?;
        batch.put_cf(cf_entries, entry.sequence.to_be_bytes(), &value);

        let cf_index = self.cf_handle(CF_ORDER_INDEX)?;
        let index_key = Self::index_key(&entry.record.order_id, entry.sequence);
        batch.put_cf(cf_index, &index_key, []);

        self.db.write(batch)?;

        tracing::debug!(
            sequence = entry.sequence,
            order_id = %entry.record.order_id,
            current_hash = %entry.current_hash,
            "Entry appended"
        );

        Ok(())
    }

    /// Get entry by sequence
    pub fn entry(&self, sequence: u64) -> Result<LedgerEntry> {
        let cf = self.cf_handle(CF_ENTRIES)?;

        let value = self
            .db
            .get_cf(cf, sequence.to_be_bytes())?
            .ok_or_else(|| Error::EntryNotFound(sequence.to_string()))?;

        let entry: LedgerEntry = bincode::deserialize(&value)?;
        Ok(entry)
    }

    /// Get the most recent entry (None when the chain is empty)
    pub fn latest_entry(&self) -> Result<Option<LedgerEntry>> {
        let cf = self.cf_handle(CF_ENTRIES)?;

        let iter = self.db.iterator_cf(cf, IteratorMode::End);

        for item in iter {
            let (_, value) = item?;
            let entry: LedgerEntry = bincode::deserialize(&value)?;
            return Ok(Some(entry));
        }

        Ok(None)
    }

    /// Get entries committed for one order (via index)
    pub fn entries_for_order(&self, order_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let cf_index = self.cf_handle(CF_ORDER_INDEX)?;

        let prefix = order_id.as_bytes();
        let iter = self.db.prefix_iterator_cf(cf_index, prefix);

        let mut entries = Vec::new();
        for item in iter {
            let (key, _) = item?;

            // prefix_iterator may run past the prefix; stop at first mismatch
            if key.len() < 24 || &key[..16] != prefix.as_slice() {
                break;
            }

            let sequence_bytes: [u8; 8] = key[16..24].try_into().unwrap();
            let sequence = u64::from_be_bytes(sequence_bytes);
            entries.push(self.entry(sequence)?);
        }

        Ok(entries)
    }

    /// Walk the full chain from genesis in sequence order
    pub fn for_each_entry(&self, mut f: impl FnMut(LedgerEntry) -> Result<()>) -> Result<()> {
        let cf = self.cf_handle(CF_ENTRIES)?;

        let iter = self.db.iterator_cf(cf, IteratorMode::Start);
        for item in iter {
            let (_, value) = item?;
            let entry: LedgerEntry = bincode::deserialize(&value)?;
            f(entry)?;
        }

        Ok(())
    }

    fn index_key(order_id: &Uuid, sequence: u64) -> Vec<u8> {
        let mut key = order_id.as_bytes().to_vec();
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash_record;
    use crate::types::{ChainHash, LineItem, TransactionRecord};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn test_entry(sequence: u64, previous_hash: ChainHash) -> LedgerEntry {
        let record = TransactionRecord {
            order_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            line_items: vec![LineItem {
                product_id: Uuid::new_v4(),
                title: "Free-range eggs".to_string(),
                quantity: 1,
                unit_price: Decimal::new(450, 2),
                farmer_id: Uuid::new_v4(),
            }],
            total: Decimal::new(450, 2),
            timestamp_nanos: 1_700_000_000_000_000_000 + sequence as i64,
        };
        let current_hash = hash_record(&record);
        LedgerEntry {
            sequence,
            record,
            previous_hash,
            current_hash,
        }
    }

    #[test]
    fn test_put_and_get_entry() {
        let (storage, _temp) = test_storage();

        let entry = test_entry(0, ChainHash::GENESIS);
        storage.put_entry(&entry).unwrap();

        let retrieved = storage.entry(0).unwrap();
        assert_eq!(retrieved, entry);

        assert!(matches!(storage.entry(7), Err(Error::EntryNotFound(_))));
    }

    #[test]
    fn test_latest_entry() {
        let (storage, _temp) = test_storage();

        assert!(storage.latest_entry().unwrap().is_none());

        let e0 = test_entry(0, ChainHash::GENESIS);
        storage.put_entry(&e0).unwrap();
        let e1 = test_entry(1, e0.current_hash);
        storage.put_entry(&e1).unwrap();

        let latest = storage.latest_entry().unwrap().unwrap();
        assert_eq!(latest.sequence, 1);
        assert_eq!(latest.previous_hash, e0.current_hash);
    }

    #[test]
    fn test_entries_for_order() {
        let (storage, _temp) = test_storage();

        let e0 = test_entry(0, ChainHash::GENESIS);
        let e1 = test_entry(1, e0.current_hash);
        storage.put_entry(&e0).unwrap();
        storage.put_entry(&e1).unwrap();

        let found = storage.entries_for_order(e1.record.order_id).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sequence, 1);

        assert!(storage.entries_for_order(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_for_each_entry_walks_in_order() {
        let (storage, _temp) = test_storage();

        let mut previous = ChainHash::GENESIS;
        for sequence in 0..5 {
            let entry = test_entry(sequence, previous);
            previous = entry.current_hash;
            storage.put_entry(&entry).unwrap();
        }

        let mut seen = Vec::new();
        storage
            .for_each_entry(|entry| {
                seen.push(entry.sequence);
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }
}
