//! Canonical binary codec: length-prefixed, tag-less, order-dependent
//! framing used for hashing, signing and storage throughout the ledger.
//!
//! Grounded on `common/bin` (writer.go/reader.go) of the original
//! `mediacoin-pro/core` implementation this system distills from, re-cast in
//! the teacher workspace's idiom of a small, independently testable crate
//! with a `thiserror` error type at its boundary.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{CodecError, Result};
pub use reader::Reader;
pub use writer::{hash256, Sink, Writer};

/// `TxIDByHash(h) = bigEndianUint64(h[0..8])`.
pub fn tx_id_by_hash(hash: &[u8; 32]) -> u64 {
    u64::from_be_bytes(hash[0..8].try_into().unwrap())
}
