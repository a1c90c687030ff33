use thiserror::Error;

/// Transaction verification/execution errors (spec §7 "Transaction
/// verification" kind set), grounded on
/// `qc-12-transaction-ordering/domain/errors.rs`'s flat per-kind enum style.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("transaction has no sender")]
    EmptySender,
    #[error("transaction payload is empty")]
    EmptyData,
    #[error("transaction payload is malformed")]
    InvalidData,
    #[error("transaction chain id does not match the configured chain")]
    InvalidChainId,
    #[error("transaction network id does not match the configured network")]
    InvalidNetworkId,
    #[error("transaction payload exceeds the maximum size")]
    DataTooLong,
    #[error("output amount must be positive")]
    IncorrectAmount,
    #[error("sender is not authorized for this transaction type")]
    IncorrectSender,
    #[error("asset is invalid for this operation")]
    IncorrectAsset,
    #[error("address is invalid")]
    IncorrectAddress,
    #[error("value must be non-negative")]
    IncorrectValue,
    #[error("nickname does not match the required pattern")]
    IncorrectNick,
    #[error("comment exceeds the maximum length")]
    LongComment,
    #[error("transaction must have at least one output")]
    EmptyOuts,
    #[error("a required parameter is empty")]
    EmptyParam,
    #[error("signature does not verify")]
    InvalidSignature,
    #[error("unknown transaction type {0}")]
    UnsupportedType(u8),
    #[error("state error: {0}")]
    State(#[from] mdc_state::StateError),
    #[error("codec error: {0}")]
    Codec(#[from] mdc_codec::CodecError),
    #[error("re-executed state updates do not match the supplied stateUpdates")]
    IncorrectTxState,
}

pub type Result<T> = std::result::Result<T, TxError>;
