//! `PutNewBlock` loop for a node configured as this chain's miner. Grounded
//! on `qc-17-block-production/src/service.rs`'s mining task for the
//! spawn/sleep shape, and on `mdc-replication`'s loops for the panic
//! isolation — the same single-authority loop pattern, pointed at
//! `ChainStorage::put_new_block` instead of a remote peer's `/blocks`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use mdc_chain::ChainStorage;
use mdc_crypto::{PrivateKey, PublicKey};
use mdc_kv::RawKv;
use mdc_mempool::Mempool;
use tracing::{error, info, warn};

const MINE_INTERVAL: Duration = Duration::from_millis(500);

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Every `MINE_INTERVAL`, drains the mempool and, if anything survives
/// execution, mines and commits one new block.
pub fn spawn_miner_loop<B: RawKv + 'static>(
    chain: Arc<ChainStorage<B>>,
    mempool: Arc<Mempool>,
    miner_priv_key: PrivateKey,
    miner_pub_key: PublicKey,
    now: fn() -> i64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let tick = AssertUnwindSafe(mine_tick(&chain, &mempool, &miner_priv_key, &miner_pub_key, now))
                .catch_unwind()
                .await;

            match tick {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "mine tick failed"),
                Err(panic) => error!(message = %panic_message(panic), "mine tick panicked"),
            }

            tokio::time::sleep(MINE_INTERVAL).await;
        }
    })
}

async fn mine_tick<B: RawKv>(
    chain: &ChainStorage<B>,
    mempool: &Mempool,
    miner_priv_key: &PrivateKey,
    miner_pub_key: &PublicKey,
    now: fn() -> i64,
) -> mdc_chain::Result<()> {
    let candidates = mempool.pop_all();
    if candidates.is_empty() {
        return Ok(());
    }

    let timestamp = now();
    match chain.put_new_block(candidates.clone(), miner_priv_key, miner_pub_key, timestamp, 0)? {
        Some(committed) => {
            info!(count = committed.len(), num = chain.last_header().num, "mined a new block");
        }
        None => {
            // Nothing survived execution this round; the candidates are
            // gone from the pool, so put them back for the next tick.
            mempool.put_many(candidates);
        }
    }
    Ok(())
}
