//! Node binary (§4, ambient): opens chain storage, then runs this node as
//! either the chain's miner or a follower replicating from `peer_url`,
//! behind an HTTP server other followers can replicate from in turn.
//!
//! `tracing_subscriber` init and the `ctrl_c` shutdown wait are grounded on
//! `node-runtime/src/main.rs`; the rest of that file's subsystem wiring is
//! too tied to the teacher's plug-and-play multi-crate architecture to
//! reuse, since this ledger has no consensus/finality/sharding subsystems
//! to wire up.

mod cli;
mod config;
mod error;
mod miner;
mod server;

use std::sync::Arc;

use clap::Parser;
use mdc_chain::{ChainConfig, ChainStorage};
use mdc_crypto::Secp256k1Scheme;
use mdc_kv::RocksDbKv;
use mdc_mempool::Mempool;
use mdc_replication::{spawn_block_pull_loop, spawn_mempool_push_loop, HttpRemoteNode};
use tracing::info;

use crate::config::Config;

fn now_micros() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_micros() as i64
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = cli::Args::parse();
    let mut config = Config::load(&args.config_path)?;
    config.apply_overrides(&args);

    info!(chain_id = config.chain_id, dir = %config.dir, "starting mdc-node");

    let backend = RocksDbKv::open_default(&config.dir)?;
    let master_pub_key = config.master_pub_key_bytes()?;
    let chain_cfg = ChainConfig {
        network: config.network_id,
        chain_id: config.chain_id,
        master_pub_key,
        verify_txs_level: config.verify_txs_level,
    };
    let chain = Arc::new(ChainStorage::open(
        backend,
        Box::new(Secp256k1Scheme::new()),
        chain_cfg,
        config.genesis_timestamp,
    )?);
    let mempool = Arc::new(Mempool::new(Box::new(Secp256k1Scheme::new())));

    info!(num = chain.last_header().num, "chain storage opened");

    let mut tasks = Vec::new();

    if let Some(miner_priv_key) = config.miner_priv_key_bytes()? {
        info!("running as the chain's miner");
        tasks.push(crate::miner::spawn_miner_loop(
            chain.clone(),
            mempool.clone(),
            miner_priv_key,
            master_pub_key,
            now_micros,
        ));
    } else if let Some(peer_url) = &config.peer_url {
        info!(peer_url, "running as a follower");
        let remote: Arc<dyn mdc_replication::RemoteNode> = Arc::new(HttpRemoteNode::new(peer_url.clone())?);
        tasks.push(spawn_block_pull_loop(
            chain.clone(),
            mempool.clone(),
            remote.clone(),
            now_micros,
        ));
        tasks.push(spawn_mempool_push_loop(mempool.clone(), remote));
    } else {
        anyhow::bail!("config must set either miner_priv_key or peer_url");
    }

    let app = server::router(chain.clone(), mempool.clone());
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "HTTP server listening");
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "HTTP server exited");
        }
    });
    tasks.push(server);

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    for task in tasks {
        task.abort();
    }

    Ok(())
}
