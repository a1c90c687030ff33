use thiserror::Error;

/// Replication-loop failures (§4.8, C10). Every variant here is a transport
/// or decode failure; chain-level rejections (bad signature, insufficient
/// funds, …) come back wrapped from `mdc_chain::ChainError`.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(&'static str),
    #[error("codec error: {0}")]
    Codec(#[from] mdc_codec::CodecError),
    #[error("block error: {0}")]
    Block(#[from] mdc_block::BlockError),
    #[error("tx error: {0}")]
    Tx(#[from] mdc_tx::TxError),
    #[error("chain error: {0}")]
    Chain(#[from] mdc_chain::ChainError),
}

pub type Result<T> = std::result::Result<T, ReplicationError>;
