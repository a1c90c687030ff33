//! The pending-transaction pool (§4.7, C9): a flat map keyed by tx ID behind
//! a reader-writer lock, grounded on `chain/mempool/storage.go`'s `Storage`
//! (a `sync.RWMutex`-guarded `map[uint64]*Transaction`) — restructured as one
//! `parking_lot::RwLock<HashMap<..>>` in the style of
//! `qc-06-mempool/domain/pool.rs`'s single-struct pool, but without that
//! teacher's gas-price queue, nonce ordering or Replace-by-Fee machinery:
//! this ledger has no fee market, so every accepted tx is simply pending
//! until a block includes or the operator drops it.

use std::collections::HashMap;

use mdc_crypto::SignatureScheme;
use mdc_state::Address;
use mdc_tx::Transaction;
use parking_lot::RwLock;

/// Concurrent pending-transaction set. Readers and writers coordinate
/// through a single reader-writer lock (§5); there is no persistence, so a
/// crash loses everything still pending.
pub struct Mempool {
    scheme: Box<dyn SignatureScheme>,
    txs: RwLock<HashMap<u64, Transaction>>,
}

impl Mempool {
    pub fn new(scheme: Box<dyn SignatureScheme>) -> Self {
        Self {
            scheme,
            txs: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts `tx`, keyed by its ID, replacing any prior entry with the
    /// same ID (matching the original's plain map assignment).
    pub fn put(&self, tx: Transaction) {
        self.txs.write().insert(tx.id(), tx);
    }

    pub fn put_many(&self, txs: impl IntoIterator<Item = Transaction>) {
        let mut guard = self.txs.write();
        for tx in txs {
            guard.insert(tx.id(), tx);
        }
    }

    /// Removes and returns an arbitrary pending transaction, or `None` if
    /// the pool is empty. Iteration order over the backing map is
    /// unspecified, matching the original's "first map entry" pop.
    pub fn pop(&self) -> Option<Transaction> {
        let mut guard = self.txs.write();
        let id = *guard.keys().next()?;
        guard.remove(&id)
    }

    /// Removes and returns every pending transaction, leaving the pool
    /// empty.
    pub fn pop_all(&self) -> Vec<Transaction> {
        let mut guard = self.txs.write();
        std::mem::take(&mut *guard).into_values().collect()
    }

    /// Transactions whose sender derives to `addr`. A linear scan, matching
    /// `TxsByAddress`'s lack of a secondary index.
    pub fn by_address(&self, addr: &Address) -> Vec<Transaction> {
        self.txs
            .read()
            .values()
            .filter(|tx| self.scheme.derive_address(&tx.sender) == *addr)
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Transaction> {
        self.txs.read().values().cloned().collect()
    }

    pub fn remove(&self, ids: &[u64]) {
        let mut guard = self.txs.write();
        for id in ids {
            guard.remove(id);
        }
    }

    pub fn size(&self) -> usize {
        self.txs.read().len()
    }

    pub fn size_of(&self, kind: u8) -> usize {
        self.txs.read().values().filter(|tx| tx.kind == kind).count()
    }
}
