use thiserror::Error;

/// Failures raised by the binary codec.
///
/// Grounded on the variable-integer framing described in the original
/// `common/bin` writer/reader pair: a malformed length prefix or a
/// truncated stream is `CorruptData`; a reader given a cumulative byte
/// budget that is exceeded returns `LimitExceeded`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("corrupt data: {0}")]
    CorruptData(&'static str),

    #[error("read limit of {limit} bytes exceeded")]
    LimitExceeded { limit: u64 },

    #[error("unsupported kind: {0}")]
    UnsupportedKind(u8),
}

pub type Result<T> = std::result::Result<T, CodecError>;
