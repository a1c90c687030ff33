//! Driven port for talking to a remote peer (§4.8), grounded on
//! `qc-16-api-gateway`'s outbound client shape (`tools/qc-admin/src/api/client.rs`):
//! a thin async trait the two replication loops run against, so tests can
//! swap in an in-memory double instead of a real HTTP peer.

use async_trait::async_trait;
use mdc_block::Block;
use mdc_tx::Transaction;

use crate::error::Result;

/// The peer this node replicates from/to.
#[async_trait]
pub trait RemoteNode: Send + Sync {
    /// Up to `limit` blocks starting at `from` (inclusive), oldest first.
    /// An empty result means the peer has nothing new past `from`.
    async fn fetch_blocks(&self, from: u64, limit: u32) -> Result<Vec<Block>>;

    /// Submit one locally-pending transaction to the peer's mempool.
    async fn put_tx(&self, tx: &Transaction) -> Result<()>;
}
