use thiserror::Error;

/// Failures specific to loading and decoding a node's own configuration.
/// Everything past that point in `main` (storage, chain, replication) is a
/// capability-specific error already converted by `anyhow`'s blanket `From`.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid hex key {field}: {source}")]
    InvalidKeyHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    #[error("key {field} has the wrong length: expected {expected} bytes, got {actual}")]
    InvalidKeyLen {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, NodeError>;
