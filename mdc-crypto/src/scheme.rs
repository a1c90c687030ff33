//! The `SignatureScheme` capability (spec §3, §4.3): keypair generation,
//! signing, verification and address derivation. The core treats the
//! concrete elliptic-curve primitives as an external collaborator behind
//! this trait; `Secp256k1Scheme` is the production implementation, grounded
//! on `qc-10-signature-verification/domain/ecdsa.rs`'s use of the `k256`
//! crate, adapted to the spec's 64-byte (x, y) public key and 64-byte (r, s)
//! signature encoding rather than Ethereum-style recoverable signatures.

use crate::error::CryptoError;
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub type PublicKey = [u8; 64];
pub type PrivateKey = [u8; 32];
pub type Signature = [u8; 64];

/// Capability exposed to the rest of the core. Kept as a trait (rather than
/// free functions) so tests can substitute a deterministic fake, the same
/// seam the teacher draws around its `EcdsaVerifier`.
pub trait SignatureScheme: Send + Sync {
    fn sign(&self, priv_key: &PrivateKey, msg: &[u8]) -> Result<Signature, CryptoError>;
    fn verify(&self, pub_key: &PublicKey, msg: &[u8], sig: &Signature) -> bool;
    fn derive_address(&self, pub_key: &PublicKey) -> [u8; 20];
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Scheme;

impl Secp256k1Scheme {
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh keypair; used by tests and by key-rotation flows.
    pub fn generate() -> (PrivateKey, PublicKey) {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let priv_bytes: PrivateKey = signing_key.to_bytes().into();
        let pub_key = public_key_of(&signing_key);
        (priv_bytes, pub_key)
    }
}

fn public_key_of(signing_key: &SigningKey) -> PublicKey {
    let point = VerifyingKey::from(signing_key).to_encoded_point(false);
    let mut out = [0u8; 64];
    // Uncompressed SEC1 point is `0x04 || x (32) || y (32)`; the spec's
    // public key is the bare (x, y) pair.
    out.copy_from_slice(&point.as_bytes()[1..65]);
    out
}

fn verifying_key_from(pub_key: &PublicKey) -> Option<VerifyingKey> {
    let mut sec1 = [0u8; 65];
    sec1[0] = 0x04;
    sec1[1..].copy_from_slice(pub_key);
    VerifyingKey::from_sec1_bytes(&sec1).ok()
}

impl SignatureScheme for Secp256k1Scheme {
    fn sign(&self, priv_key: &PrivateKey, msg: &[u8]) -> Result<Signature, CryptoError> {
        let signing_key =
            SigningKey::from_bytes(priv_key.into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let sig: EcdsaSignature = signing_key.sign(msg);
        let mut out = [0u8; 64];
        out.copy_from_slice(&sig.to_bytes());
        Ok(out)
    }

    fn verify(&self, pub_key: &PublicKey, msg: &[u8], sig: &Signature) -> bool {
        let Some(verifying_key) = verifying_key_from(pub_key) else {
            return false;
        };
        let Ok(signature) = EcdsaSignature::from_slice(sig) else {
            return false;
        };
        use k256::ecdsa::signature::Verifier;
        verifying_key.verify(msg, &signature).is_ok()
    }

    fn derive_address(&self, pub_key: &PublicKey) -> [u8; 20] {
        // Address = RIPEMD160(SHA256(x ‖ y)).
        let sha = Sha256::digest(pub_key);
        let ripemd = Ripemd160::digest(sha);
        let mut out = [0u8; 20];
        out.copy_from_slice(&ripemd);
        out
    }
}

/// `UserID = firstEightBytesBigEndian(address20)`.
pub fn user_id_of(address: &[u8; 20]) -> u64 {
    u64::from_be_bytes(address[0..8].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let scheme = Secp256k1Scheme::new();
        let (sk, pk) = Secp256k1Scheme::generate();
        let msg = b"hello ledger";
        let sig = scheme.sign(&sk, msg).unwrap();
        assert!(scheme.verify(&pk, msg, &sig));
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let scheme = Secp256k1Scheme::new();
        let (sk, pk) = Secp256k1Scheme::generate();
        let sig = scheme.sign(&sk, b"original").unwrap();
        assert!(!scheme.verify(&pk, b"tampered", &sig));
    }

    #[test]
    fn derive_address_is_deterministic_and_20_bytes() {
        let scheme = Secp256k1Scheme::new();
        let (_, pk) = Secp256k1Scheme::generate();
        let a1 = scheme.derive_address(&pk);
        let a2 = scheme.derive_address(&pk);
        assert_eq!(a1, a2);
        assert_eq!(a1.len(), 20);
    }

    #[test]
    fn user_id_is_first_eight_bytes_big_endian() {
        let addr = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(user_id_of(&addr), 0x0102030405060708);
    }
}
