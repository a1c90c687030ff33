//! The HTTP surface a follower's [`mdc_replication::HttpRemoteNode`] talks
//! to: `GET /blocks` and `POST /tx`, mirroring the client in
//! `mdc-replication::http` byte-for-byte so the two sides agree on framing
//! without depending on each other. Route shape grounded on
//! `qc-16-api-gateway`'s `axum` usage (the teacher's API-gateway crate is
//! the only real `axum` dependency anywhere in the pack).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use mdc_chain::ChainStorage;
use mdc_kv::RawKv;
use mdc_mempool::Mempool;
use mdc_tx::Transaction;
use serde::Deserialize;
use tracing::warn;

struct AppState<B: RawKv> {
    chain: Arc<ChainStorage<B>>,
    mempool: Arc<Mempool>,
}

// Manual impl: `#[derive(Clone)]` would add a spurious `B: Clone` bound even
// though both fields are `Arc<_>` and clone regardless of `B`.
impl<B: RawKv> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            mempool: self.mempool.clone(),
        }
    }
}

pub fn router<B: RawKv + 'static>(chain: Arc<ChainStorage<B>>, mempool: Arc<Mempool>) -> Router {
    Router::new()
        .route("/blocks", get(get_blocks::<B>))
        .route("/tx", post(post_tx::<B>))
        .with_state(AppState { chain, mempool })
}

#[derive(Deserialize)]
struct BlocksQuery {
    from: u64,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    100
}

const MAX_BLOCKS_PER_PAGE: u32 = 500;

async fn get_blocks<B: RawKv>(
    State(state): State<AppState<B>>,
    Query(query): Query<BlocksQuery>,
) -> Result<Vec<u8>, StatusCode> {
    let limit = query.limit.min(MAX_BLOCKS_PER_PAGE);
    let tip = state.chain.last_header().num;
    let mut blocks = Vec::new();
    let mut num = query.from;
    while num <= tip && (blocks.len() as u32) < limit {
        match state.chain.get_header(num) {
            Ok(header) => {
                let mut txs = Vec::with_capacity(8);
                let mut idx = 0u32;
                loop {
                    match state.chain.get_transaction(num, idx) {
                        Ok(tx) => {
                            txs.push(tx);
                            idx += 1;
                        }
                        Err(_) => break,
                    }
                }
                blocks.push(mdc_block::Block { header, txs });
            }
            Err(e) => {
                warn!(error = %e, num, "GET /blocks: header fetch failed mid-page");
                break;
            }
        }
        num += 1;
    }
    Ok(mdc_replication::encode_blocks(&blocks))
}

async fn post_tx<B: RawKv>(State(state): State<AppState<B>>, body: axum::body::Bytes) -> StatusCode {
    match Transaction::decode(&body) {
        Ok(tx) => {
            state.mempool.put(tx);
            StatusCode::ACCEPTED
        }
        Err(e) => {
            warn!(error = %e, "POST /tx: malformed transaction body");
            StatusCode::BAD_REQUEST
        }
    }
}
