//! The two replication loops (§4.8, C10): pulling new blocks from a remote
//! peer into local `ChainStorage`, and pushing locally-pending mempool txs
//! out to that same peer.
//!
//! The `tokio::spawn` + `tracing` shape is grounded on
//! `qc-17-block-production/src/service.rs`'s mining task; panic isolation
//! around each tick is grounded on `validator/src/standard/orchestration/mod.rs`'s
//! `AssertUnwindSafe(..).catch_unwind()` guard around `drive_consensus_tick`,
//! so one bad tick logs and retries instead of taking the whole node down.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use mdc_chain::ChainStorage;
use mdc_kv::RawKv;
use mdc_mempool::Mempool;
use tracing::{error, warn};

use crate::remote::RemoteNode;

/// Extracts a human-readable message from a `catch_unwind` payload, which
/// is `Box<dyn Any + Send>` and so not `Debug` on its own.
fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

const BLOCK_PULL_BATCH_SIZE: u32 = 100;
const BLOCK_PULL_BACKOFF: Duration = Duration::from_secs(5);
const MEMPOOL_PUSH_INTERVAL: Duration = Duration::from_millis(100);
const MEMPOOL_PUSH_BACKOFF: Duration = Duration::from_secs(1);

/// Repeatedly pulls up to `BLOCK_PULL_BATCH_SIZE` blocks starting at the
/// local chain tip and commits them via `ChainStorage::put_blocks`. Runs
/// until cancelled by dropping the returned handle or via
/// `tokio::task::JoinHandle::abort`.
pub fn spawn_block_pull_loop<B: RawKv + 'static>(
    chain: Arc<ChainStorage<B>>,
    mempool: Arc<Mempool>,
    remote: Arc<dyn RemoteNode>,
    commit_ts: fn() -> i64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let tick = AssertUnwindSafe(block_pull_tick(&chain, &mempool, remote.as_ref(), commit_ts))
                .catch_unwind()
                .await;

            let made_progress = match tick {
                Ok(Ok(progressed)) => progressed,
                Ok(Err(e)) => {
                    warn!(error = %e, "block pull tick failed");
                    false
                }
                Err(panic) => {
                    error!(message = %panic_message(panic), "block pull tick panicked");
                    false
                }
            };

            if !made_progress {
                tokio::time::sleep(BLOCK_PULL_BACKOFF).await;
            }
        }
    })
}

async fn block_pull_tick<B: RawKv>(
    chain: &ChainStorage<B>,
    mempool: &Mempool,
    remote: &dyn RemoteNode,
    commit_ts: fn() -> i64,
) -> crate::error::Result<bool> {
    let from = chain.last_header().num;
    let blocks = remote.fetch_blocks(from, BLOCK_PULL_BATCH_SIZE).await?;
    if blocks.is_empty() {
        return Ok(false);
    }
    let committed = chain.put_blocks(blocks, commit_ts())?;
    mempool.remove(&committed);
    Ok(true)
}

/// Every `MEMPOOL_PUSH_INTERVAL`, drains the local mempool and forwards
/// every tx to `remote`; a tx that fails to send is put back so a later
/// tick retries it.
pub fn spawn_mempool_push_loop(
    mempool: Arc<Mempool>,
    remote: Arc<dyn RemoteNode>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let tick = AssertUnwindSafe(mempool_push_tick(&mempool, remote.as_ref()))
                .catch_unwind()
                .await;

            let transport_failed = match tick {
                Ok(Ok(())) => false,
                Ok(Err(e)) => {
                    warn!(error = %e, "mempool push tick failed");
                    true
                }
                Err(panic) => {
                    error!(message = %panic_message(panic), "mempool push tick panicked");
                    true
                }
            };

            tokio::time::sleep(if transport_failed {
                MEMPOOL_PUSH_BACKOFF
            } else {
                MEMPOOL_PUSH_INTERVAL
            })
            .await;
        }
    })
}

async fn mempool_push_tick(mempool: &Mempool, remote: &dyn RemoteNode) -> crate::error::Result<()> {
    for tx in mempool.all() {
        match remote.put_tx(&tx).await {
            Ok(()) => mempool.remove(&[tx.id()]),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mdc_block::Block;
    use mdc_crypto::Secp256k1Scheme;
    use mdc_tx::{Emission, EmissionOutput, TxData};
    use num_bigint::BigInt;
    use parking_lot::Mutex;

    use mdc_tx::Transaction;

    struct FakeRemote {
        blocks: Mutex<Vec<Block>>,
        pushed: Mutex<Vec<Transaction>>,
        fail_push: bool,
    }

    #[async_trait]
    impl RemoteNode for FakeRemote {
        async fn fetch_blocks(&self, _from: u64, _limit: u32) -> crate::error::Result<Vec<Block>> {
            Ok(std::mem::take(&mut *self.blocks.lock()))
        }

        async fn put_tx(&self, tx: &Transaction) -> crate::error::Result<()> {
            if self.fail_push {
                return Err(crate::error::ReplicationError::Malformed("forced failure"));
            }
            self.pushed.lock().push(tx.clone());
            Ok(())
        }
    }

    fn emission_tx(nonce: u64, sender: mdc_crypto::PublicKey) -> Transaction {
        let data = TxData::Emission(Emission {
            asset: vec![],
            comment: String::new(),
            outs: vec![EmissionOutput {
                kind: 0,
                address: [1u8; 20],
                value: BigInt::from(0),
                amount: BigInt::from(1u64),
            }],
        })
        .encode();
        Transaction {
            kind: 1,
            version: 1,
            network: 1,
            chain_id: 1,
            nonce,
            data,
            reserved1: 0,
            reserved2: 0,
            sender,
            sig: [0u8; 64],
            state_updates: vec![],
            block_num: 0,
            block_idx: 0,
            block_ts: 0,
        }
    }

    #[tokio::test]
    async fn mempool_push_tick_drains_on_success() {
        let mempool = Mempool::new(Box::new(Secp256k1Scheme::new()));
        let (_, pub_key) = Secp256k1Scheme::generate();
        mempool.put(emission_tx(0, pub_key));
        assert_eq!(mempool.size(), 1);

        let remote = FakeRemote {
            blocks: Mutex::new(vec![]),
            pushed: Mutex::new(vec![]),
            fail_push: false,
        };

        mempool_push_tick(&mempool, &remote).await.unwrap();
        assert_eq!(mempool.size(), 0);
        assert_eq!(remote.pushed.lock().len(), 1);
    }

    #[tokio::test]
    async fn mempool_push_tick_keeps_tx_on_transport_failure() {
        let mempool = Mempool::new(Box::new(Secp256k1Scheme::new()));
        let (_, pub_key) = Secp256k1Scheme::generate();
        mempool.put(emission_tx(0, pub_key));

        let remote = FakeRemote {
            blocks: Mutex::new(vec![]),
            pushed: Mutex::new(vec![]),
            fail_push: true,
        };

        assert!(mempool_push_tick(&mempool, &remote).await.is_err());
        assert_eq!(mempool.size(), 1);
    }
}
