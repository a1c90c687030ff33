//! Ordered-KV storage capability (C4): a small `RawKv` port plus the
//! `Store` service layered on top of it (queries, transactions, sequences,
//! dump/restore/vacuum). `mdc-chain` and `mdc-state` depend only on
//! `Store`, never on a concrete backend.

pub mod error;
pub mod memory;
pub mod rocksdb_adapter;
pub mod store;
pub mod traits;

pub use error::{KvError, Result};
pub use memory::MemoryKv;
pub use rocksdb_adapter::{RocksDbConfig, RocksDbKv};
pub use store::{Query, Store, Txn};
pub use traits::{BatchOp, RawKv};
