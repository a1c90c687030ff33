//! Crypto capability (C2) and keyed-address text encoding (C11).
//!
//! Grounded on `qc-10-signature-verification` (ECDSA verification idiom)
//! and `shared-crypto` (hashing helpers), adapted to the spec's concrete
//! choice of SHA-256 + RIPEMD-160 for address derivation and base58 text
//! addresses with an `"MDC"` prefix (spec §3, §6).

pub mod address;
pub mod error;
pub mod scheme;

pub use address::{decode_address, encode_address};
pub use error::{AddressCodecError, CryptoError};
pub use scheme::{user_id_of, PrivateKey, PublicKey, Secp256k1Scheme, Signature, SignatureScheme};
