use thiserror::Error;

/// Chain-storage errors (spec §7's "Commit invariants", "Lookup", and
/// "Storage" kinds), grounded on `qc-02-block-storage/domain/errors.rs`'s
/// flat per-kind enum style.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transaction {id:#x} is already registered")]
    TxAlreadyRegistered { id: u64 },
    #[error("user already registered (userID or nick collision)")]
    UserAlreadyRegistered,
    #[error("stateUpdates do not match re-execution")]
    IncorrectTxState,
    #[error("chainRoot does not match the block's claimed chainRoot")]
    IncorrectChainRoot,
    #[error("stateRoot does not match the block's claimed stateRoot")]
    IncorrectStateRoot,
    #[error("block not found: {num}")]
    BlockNotFound { num: u64 },
    #[error("transaction not found")]
    TxNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("address not found")]
    AddrNotFound,
    #[error("address could not be parsed: {0}")]
    IncorrectAddress(String),
    #[error("no blocks were given to PutBlock")]
    EmptyBatch,
    #[error(transparent)]
    Kv(#[from] mdc_kv::KvError),
    #[error(transparent)]
    Block(#[from] mdc_block::BlockError),
    #[error(transparent)]
    Tx(#[from] mdc_tx::TxError),
    #[error(transparent)]
    State(#[from] mdc_state::StateError),
    #[error(transparent)]
    Codec(#[from] mdc_codec::CodecError),
}

pub type Result<T> = std::result::Result<T, ChainError>;
