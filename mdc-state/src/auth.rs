//! `setAuthInfo`/`authInfo` (§4.2): key rotation is modeled as a balance
//! write against the `AUTH` pseudo-asset, so it rides the same update log
//! and Merkle commitment as every other state change instead of needing a
//! parallel storage path.

use crate::entities::{Address, ASSET_AUTH};
use crate::error::Result;
use crate::overlay::State;
use num_bigint::{BigInt, Sign};

/// Raw byte length of the public keys this ledger carries (two 32-byte
/// curve coordinates, matching `mdc-crypto::scheme::PublicKey`).
pub const KEY_SIZE: usize = 64;

const AUTH_MARKER: u8 = 0x01;

impl<'p> State<'p> {
    /// Record that `address` now authenticates with `pub_key` instead of
    /// its original signing key.
    pub fn set_auth_info(&self, address: &Address, pub_key: &[u8; KEY_SIZE]) -> Result<()> {
        let mut raw = Vec::with_capacity(1 + KEY_SIZE);
        raw.push(AUTH_MARKER);
        raw.extend_from_slice(pub_key);
        let balance = BigInt::from_bytes_be(Sign::Plus, &raw);
        self.set(&[ASSET_AUTH], address, balance, 0)
    }

    /// The currently-rotated public key for `address`, if any.
    pub fn auth_info(&self, address: &Address) -> Option<[u8; KEY_SIZE]> {
        let balance = self.get(&[ASSET_AUTH], address);
        let (sign, bytes) = balance.to_bytes_be();
        if sign == Sign::NoSign {
            return None;
        }
        if bytes.len() != 1 + KEY_SIZE || bytes[0] != AUTH_MARKER {
            return None;
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes[1..]);
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::EmptySource;

    #[test]
    fn set_then_get_auth_info_round_trips() {
        let root = EmptySource;
        let state = State::new(1, &root);
        let key = [7u8; KEY_SIZE];
        state.set_auth_info(&[1u8; 20], &key).unwrap();
        assert_eq!(state.auth_info(&[1u8; 20]), Some(key));
    }

    #[test]
    fn auth_info_absent_by_default() {
        let root = EmptySource;
        let state = State::new(1, &root);
        assert_eq!(state.auth_info(&[2u8; 20]), None);
    }

    #[test]
    fn numeric_balance_is_not_mistaken_for_auth_info_at_other_lengths() {
        let root = EmptySource;
        let state = State::new(1, &root);
        state
            .set(&[ASSET_AUTH], &[3u8; 20], BigInt::from(42), 0)
            .unwrap();
        assert_eq!(state.auth_info(&[3u8; 20]), None);
    }
}
