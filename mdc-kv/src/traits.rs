//! Driven port for the storage engine (C4), grounded on
//! `qc-02-block-storage/ports/outbound.rs`'s `KeyValueStore`/`BatchOperation`:
//! the same get/put/delete/atomic-batch/prefix-scan shape, generalized with
//! an order flag (the original spec's ordered-KV query engine scans both
//! ascending and descending) and a `compact` hook the production RocksDB
//! adapter uses to back `vacuum`.

use crate::error::Result;

#[derive(Debug, Clone)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOp {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOp::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOp::Delete { key: key.into() }
    }
}

/// Raw byte-oriented storage capability. `mdc-kv::Store` layers ordered
/// queries, sequences, and dump/restore on top of this; `mdc-chain` and
/// `mdc-state` never talk to it directly.
pub trait RawKv: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Apply `ops` atomically: either all are durable afterward, or none are.
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()>;

    /// All pairs whose key starts with `prefix`, ordered ascending by key if
    /// `desc` is false, descending otherwise.
    fn prefix_scan(&self, prefix: &[u8], desc: bool) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Reclaim space left behind by deletes/overwrites. A no-op for the
    /// in-memory backend; triggers RocksDB's manual compaction in production.
    fn compact(&self) -> Result<()> {
        Ok(())
    }
}
