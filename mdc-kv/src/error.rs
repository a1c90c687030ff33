use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("key not found")]
    NotFound,

    #[error("dump/restore record is truncated or malformed")]
    CorruptDump,

    #[error("sequence {0} overflowed u64")]
    SequenceOverflow(u8),
}

pub type Result<T> = std::result::Result<T, KvError>;
