use thiserror::Error;

/// Block-verification errors (spec §7 "Block verification" kind set),
/// grounded on `qc-17-block-production/error.rs`'s flat per-kind enum.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("block has no transactions")]
    EmptyBlock,
    #[error("block equals the genesis header")]
    InvalidGenesisBlock,
    #[error("miner public key is empty")]
    EmptyMinerKey,
    #[error("miner public key does not match the master key")]
    InvalidMinerKey,
    #[error("block signature does not verify")]
    InvalidBlockSig,
    #[error("block number is not prev.num + 1")]
    InvalidBlockNum,
    #[error("block timestamp is before the previous block's")]
    InvalidBlockTs,
    #[error("block network does not match the configured network")]
    InvalidNetwork,
    #[error("block chain id does not match the configured chain")]
    InvalidChainId,
    #[error("prevHash does not match the previous block's hash")]
    InvalidPrevHash,
    #[error("txRoot does not match the recomputed transaction merkle root")]
    InvalidTxsMerkleRoot,
    #[error("transaction error: {0}")]
    Tx(#[from] mdc_tx::TxError),
    #[error("signing error: {0}")]
    Sign(#[from] mdc_crypto::CryptoError),
    #[error("codec error: {0}")]
    Codec(#[from] mdc_codec::CodecError),
}

pub type Result<T> = std::result::Result<T, BlockError>;
