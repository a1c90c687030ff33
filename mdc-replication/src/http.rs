//! HTTP adapter for [`RemoteNode`], grounded on `tools/qc-admin/src/api/client.rs`'s
//! `reqwest::Client` usage (timeouts, connect-timeout, mapped transport errors).
//!
//! Wire format stays the ledger's own binary codec rather than JSON: a
//! `/blocks` reply is a `Writer::write_slice` of `Bytes`-framed blocks, and a
//! `/tx` request body is one tx's raw `encode()`.

use std::time::Duration;

use mdc_block::Block;
use mdc_codec::{Reader, Writer};
use mdc_tx::Transaction;

use crate::error::{ReplicationError, Result};
use crate::remote::RemoteNode;

pub struct HttpRemoteNode {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteNode {
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(3))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl RemoteNode for HttpRemoteNode {
    async fn fetch_blocks(&self, from: u64, limit: u32) -> Result<Vec<Block>> {
        let url = format!("{}/blocks?from={}&limit={}", self.base_url, from, limit);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let mut r = Reader::new(&body);
        let count = r.read_varuint().map_err(ReplicationError::Codec)? as usize;
        let mut blocks = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            let bytes = r.read_bytes().map_err(ReplicationError::Codec)?;
            blocks.push(Block::decode(&bytes)?);
        }
        Ok(blocks)
    }

    async fn put_tx(&self, tx: &Transaction) -> Result<()> {
        let url = format!("{}/tx", self.base_url);
        self.client
            .post(&url)
            .body(tx.encode())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// The `/blocks` response body format, shared with the server side so a
/// node's HTTP handler and this client agree on the framing without
/// depending on each other.
pub fn encode_blocks(blocks: &[Block]) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_slice(blocks, |w, b| w.write_bytes(&b.encode()));
    w.into_bytes()
}
