//! Backs the Merkle/Patricia tries (C3) with the ordered-KV store (C4):
//! trie nodes are content-addressed, so writes inside a `PutBlock`
//! transaction are just ordinary KV puts keyed by node hash under the
//! `ChainTree`/`StateTree` entities (§4.5), committed atomically with
//! every other index write in the same KV transaction. Grounded on
//! `node-runtime/adapters/storage/rocksdb_adapter.rs`'s
//! `RocksDbTrieDatabase` (a `TrieDb`-shaped wrapper over the same
//! key-value backend used for everything else).

use crate::keys::node_key;
use mdc_kv::{RawKv, Txn};
use mdc_trie::{Hash, TrieDb};

/// A `TrieDb` view over an in-flight KV transaction. Reads see both
/// already-committed nodes and nodes written earlier in the same
/// transaction; nothing is visible to other callers until the transaction
/// commits.
pub struct KvTrieDb<'a, 'b, B: RawKv> {
    txn: &'a mut Txn<'b, B>,
    entity: u8,
}

impl<'a, 'b, B: RawKv> KvTrieDb<'a, 'b, B> {
    pub fn new(txn: &'a mut Txn<'b, B>, entity: u8) -> Self {
        Self { txn, entity }
    }
}

impl<'a, 'b, B: RawKv> TrieDb for KvTrieDb<'a, 'b, B> {
    fn get_node(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.txn.get(&node_key(self.entity, hash)).ok().flatten()
    }

    fn put_node(&mut self, hash: Hash, data: Vec<u8>) {
        self.txn.put(node_key(self.entity, &hash), data);
    }
}

/// A read-only `TrieDb` view over the committed backend, used outside a
/// transaction for balance lookups that don't need to write.
pub struct ReadOnlyTrieDb<'a, B: RawKv> {
    backend: &'a B,
    entity: u8,
}

impl<'a, B: RawKv> ReadOnlyTrieDb<'a, B> {
    pub fn new(backend: &'a B, entity: u8) -> Self {
        Self { backend, entity }
    }
}

impl<'a, B: RawKv> TrieDb for ReadOnlyTrieDb<'a, B> {
    fn get_node(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.backend
            .get(&node_key(self.entity, hash))
            .ok()
            .flatten()
    }

    fn put_node(&mut self, _hash: Hash, _data: Vec<u8>) {
        unreachable!("ReadOnlyTrieDb is never handed to a mutating PatriciaTrie::put call")
    }
}
