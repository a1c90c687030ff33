//! Production `RawKv` backend, grounded on
//! `node-runtime/adapters/storage/rocksdb_adapter.rs`'s `RocksDbStore`/
//! `RocksDbConfig`: same tuning knobs (block cache, write buffer, Snappy,
//! bloom filter) and the same `Arc<RwLock<DB>>` handle, but a single column
//! family — the chain's own key layout (entity-tagged keys, see
//! `mdc-chain::keys`) already partitions the keyspace the way the teacher's
//! four column families do, so one CF keeps `compact`/`dump`/`restore`
//! simple without losing isolation.

use crate::error::{KvError, Result};
use crate::traits::{BatchOp, RawKv};
use parking_lot::RwLock;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    pub path: String,
    pub block_cache_size: usize,
    pub write_buffer_size: usize,
    pub max_write_buffer_number: i32,
    pub target_file_size_base: u64,
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/mdc".to_string(),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
            target_file_size_base: 64 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            target_file_size_base: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

pub struct RocksDbKv {
    db: Arc<RwLock<DB>>,
    sync_writes: bool,
}

impl RocksDbKv {
    pub fn open(config: RocksDbConfig) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_target_file_size_base(config.target_file_size_base);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| KvError::Io {
            message: format!("failed to open rocksdb at {}: {e}", config.path),
        })?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            sync_writes: config.sync_writes,
        })
    }

    pub fn open_default(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(RocksDbConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        })
    }
}

impl RawKv for RocksDbKv {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let db = self.db.read();
        db.get(key).map_err(|e| KvError::Io {
            message: format!("rocksdb get failed: {e}"),
        })
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let db = self.db.write();
        let mut batch = WriteBatch::default();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => batch.put(&key, &value),
                BatchOp::Delete { key } => batch.delete(&key),
            }
        }
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        db.write_opt(batch, &write_opts).map_err(|e| KvError::Io {
            message: format!("rocksdb batch write failed: {e}"),
        })
    }

    fn prefix_scan(&self, prefix: &[u8], desc: bool) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let db = self.db.read();
        let mode = if desc {
            // Seeking past the prefix then walking backward lands the
            // iterator on the last key that starts with `prefix`.
            let mut upper = prefix.to_vec();
            upper.push(0xff);
            IteratorMode::From(&upper, rocksdb::Direction::Reverse)
        } else {
            IteratorMode::From(prefix, rocksdb::Direction::Forward)
        };
        let iter = db.iterator(mode);
        let mut out = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| KvError::Io {
                message: format!("rocksdb scan failed: {e}"),
            })?;
            if desc {
                if key.as_ref() > prefix && !key.starts_with(prefix) {
                    continue;
                }
                if !key.starts_with(prefix) {
                    break;
                }
            } else if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }
        Ok(out)
    }

    fn compact(&self) -> Result<()> {
        let db = self.db.write();
        db.compact_range(None::<&[u8]>, None::<&[u8]>);
        Ok(())
    }
}
