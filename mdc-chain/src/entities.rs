//! Chain-wide read models (§4.5, §6): the running `Statistic` and the
//! combined `AddressInfo` projection, grounded on the original
//! `chain/bcstore/statistic.go` and `chain/address_info.go` (supplemented
//! from `original_source`, not named directly in spec.md).

use mdc_codec::{Reader, Writer};
use mdc_crypto::PublicKey;
use mdc_state::Address;
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Serialize, Serializer};

fn serialize_bigint<S: Serializer>(v: &BigInt, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&v.to_string())
}

/// Running chain-wide counters. The external JSON view serializes
/// big-integer fields as decimal strings, matching the original
/// `MarshalJSON`; on-disk storage uses the plain binary codec.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Statistic {
    pub blocks: u64,
    pub txs: u64,
    pub transfers: u64,
    pub users: u64,
    #[serde(serialize_with = "serialize_bigint")]
    pub supply: BigInt,
    #[serde(serialize_with = "serialize_bigint")]
    pub traffic: BigInt,
    pub rate: u64,
    pub bcsize: u64,
}

impl Default for Statistic {
    fn default() -> Self {
        Self {
            blocks: 0,
            txs: 0,
            transfers: 0,
            users: 0,
            supply: BigInt::zero(),
            traffic: BigInt::zero(),
            rate: 0,
            bcsize: 0,
        }
    }
}

impl Statistic {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_varint(self.blocks as i64);
        w.write_varint(self.txs as i64);
        w.write_varint(self.transfers as i64);
        w.write_varint(self.users as i64);
        w.write_bigint(&self.supply);
        w.write_bigint(&self.traffic);
        w.write_varint(self.rate as i64);
        w.write_varint(self.bcsize as i64);
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> mdc_codec::Result<Self> {
        let mut r = Reader::new(bytes);
        Ok(Self {
            blocks: r.read_varuint()?,
            txs: r.read_varuint()?,
            transfers: r.read_varuint()?,
            users: r.read_varuint()?,
            supply: r.read_bigint()?,
            traffic: r.read_bigint()?,
            rate: r.read_varuint()?,
            bcsize: r.read_varuint()?,
        })
    }
}

/// A read-only join of balance, last activity, and identity for an
/// `(asset, address)` pair — the original `AddressInfoResponse` shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressInfo {
    pub address: Address,
    pub asset: Vec<u8>,
    pub balance: BigInt,
    pub last_tx_uid: Option<u64>,
    pub user_id: Option<u64>,
    pub nick: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: u64,
    pub address: Address,
    pub nick: String,
    pub referrer_id: u64,
    pub pub_key: PublicKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistic_encode_then_decode_round_trips() {
        let mut stat = Statistic::default();
        stat.blocks = 5;
        stat.supply = BigInt::from(1_000_000_000u64);
        let decoded = Statistic::decode(&stat.encode()).unwrap();
        assert_eq!(stat, decoded);
    }
}
