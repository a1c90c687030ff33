use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key encoding")]
    InvalidPublicKey,

    #[error("invalid private key encoding")]
    InvalidPrivateKey,

    #[error("invalid signature encoding")]
    InvalidSignature,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressCodecError {
    #[error("address text is not ASCII base58")]
    InvalidEncoding,

    #[error("address checksum mismatch")]
    BadChecksum,

    #[error("address missing required \"MDC\" prefix")]
    MissingPrefix,

    #[error("decoded address body has the wrong length")]
    BadLength,

    #[error("unsupported address version {0}")]
    UnsupportedVersion(u8),
}
