//! State-overlay entities (§3, §4.2), grounded on
//! `qc-04-state-management/domain/entities.rs`'s `AccountState`/`Hash`/
//! `Address` aliases, generalized from a fixed-width account record to the
//! `(chainID, asset, address, balance, memo)` tuple the ledger actually
//! tracks, with `balance` an arbitrary-precision non-negative integer
//! instead of a fixed `u128`.

use num_bigint::BigInt;

pub type Address = [u8; 20];
pub type Asset = Vec<u8>;

/// The native coin. An empty asset string is treated identically.
pub const ASSET_MDC: u8 = 0x01;
/// Pseudo-asset carrying a rotated public key instead of a numeric balance.
pub const ASSET_AUTH: u8 = 0x02;

pub fn is_mdc(asset: &[u8]) -> bool {
    asset.is_empty() || asset == [ASSET_MDC]
}

/// A single state mutation produced by transaction execution. Equality is
/// by value, not by identity — two `StateValue`s with identical fields are
/// the same fact regardless of when they were appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateValue {
    pub chain_id: u64,
    pub asset: Asset,
    pub address: Address,
    pub balance: BigInt,
    pub memo: u64,
}

impl StateValue {
    pub fn new(chain_id: u64, asset: impl Into<Asset>, address: Address, balance: BigInt, memo: u64) -> Self {
        Self {
            chain_id,
            asset: asset.into(),
            address,
            balance,
            memo,
        }
    }

    /// The trie key this value is stored under: `address ‖ asset`.
    pub fn state_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(20 + self.asset.len());
        key.extend_from_slice(&self.address);
        key.extend_from_slice(&self.asset);
        key
    }
}
