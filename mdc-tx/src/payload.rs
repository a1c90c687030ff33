//! The four transaction payload variants (§3 "Transaction payload
//! variants", C6), grounded on
//! `qc-12-transaction-ordering/domain/entities.rs`'s tagged-variant style,
//! recast around this ledger's own fields (emission outputs, transfer
//! outputs with cross-chain routing, nickname registration, key rotation)
//! instead of the teacher's gas/fee transaction shape.

use crate::error::{Result, TxError};
use mdc_codec::{Reader, Writer};
use mdc_state::{is_mdc, Address, State, ASSET_AUTH, KEY_SIZE};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

pub const KIND_EMISSION: u8 = 1;
pub const KIND_TRANSFER: u8 = 2;
pub const KIND_USER: u8 = 3;
pub const KIND_USER_UPD: u8 = 4;

const MAX_TRANSFER_COMMENT: usize = 200;

fn valid_nick(nick: &str) -> bool {
    let bytes = nick.as_bytes();
    if bytes.len() < 3 || bytes.len() > 21 {
        return false;
    }
    let first_ok = matches!(bytes[0], b'a'..=b'z');
    let rest_ok = bytes[1..]
        .iter()
        .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-'));
    first_ok && rest_ok
}

fn write_address(w: &mut Writer<Vec<u8>>, addr: &Address) {
    w.write_fixed(addr);
}

fn read_address(r: &mut Reader) -> Result<Address> {
    Ok(r.read_fixed::<20>()?)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmissionOutput {
    pub kind: u8,
    pub address: Address,
    pub value: BigInt,
    pub amount: BigInt,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Emission {
    pub asset: Vec<u8>,
    pub comment: String,
    pub outs: Vec<EmissionOutput>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferOutput {
    pub asset: Vec<u8>,
    pub amount: BigInt,
    pub tag: u64,
    pub to: Address,
    pub to_memo: u64,
    pub to_chain_id: u64,
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub comment: String,
    pub outs: Vec<TransferOutput>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub nick: String,
    pub referrer_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserUpd {
    pub new_pub_key: [u8; KEY_SIZE],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxData {
    Emission(Emission),
    Transfer(Transfer),
    User(User),
    UserUpd(UserUpd),
}

impl TxData {
    pub fn kind(&self) -> u8 {
        match self {
            TxData::Emission(_) => KIND_EMISSION,
            TxData::Transfer(_) => KIND_TRANSFER,
            TxData::User(_) => KIND_USER,
            TxData::UserUpd(_) => KIND_USER_UPD,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        match self {
            TxData::Emission(e) => {
                w.write_bytes(&e.asset);
                w.write_string(&e.comment);
                w.write_slice(&e.outs, |w, o| {
                    w.write_u8(o.kind);
                    write_address(w, &o.address);
                    w.write_bigint(&o.value);
                    w.write_bigint(&o.amount);
                });
            }
            TxData::Transfer(t) => {
                w.write_string(&t.comment);
                w.write_slice(&t.outs, |w, o| {
                    w.write_bytes(&o.asset);
                    w.write_bigint(&o.amount);
                    w.write_varint(o.tag as i64);
                    write_address(w, &o.to);
                    w.write_varint(o.to_memo as i64);
                    w.write_varint(o.to_chain_id as i64);
                    w.write_string(&o.comment);
                });
            }
            TxData::User(u) => {
                w.write_string(&u.nick);
                w.write_varint(u.referrer_id as i64);
            }
            TxData::UserUpd(u) => {
                w.write_fixed(&u.new_pub_key);
            }
        }
        w.into_bytes()
    }

    pub fn decode(kind: u8, bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let data = match kind {
            KIND_EMISSION => {
                let asset = r.read_bytes()?;
                let comment = r.read_string()?;
                let outs = r.read_slice(|r| {
                    Ok(EmissionOutput {
                        kind: r.read_u8()?,
                        address: read_address(r)?,
                        value: r.read_bigint()?,
                        amount: r.read_bigint()?,
                    })
                })?;
                TxData::Emission(Emission { asset, comment, outs })
            }
            KIND_TRANSFER => {
                let comment = r.read_string()?;
                let outs = r.read_slice(|r| {
                    Ok(TransferOutput {
                        asset: r.read_bytes()?,
                        amount: r.read_bigint()?,
                        tag: r.read_varuint()?,
                        to: read_address(r)?,
                        to_memo: r.read_varuint()?,
                        to_chain_id: r.read_varuint()?,
                        comment: r.read_string()?,
                    })
                })?;
                TxData::Transfer(Transfer { comment, outs })
            }
            KIND_USER => TxData::User(User {
                nick: r.read_string()?,
                referrer_id: r.read_varuint()?,
            }),
            KIND_USER_UPD => TxData::UserUpd(UserUpd {
                new_pub_key: r.read_fixed::<KEY_SIZE>()?,
            }),
            other => return Err(TxError::UnsupportedType(other)),
        };
        Ok(data)
    }

    /// Structural checks independent of signature/sender policy (§7's
    /// `TxIncorrect*`/`TxEmpty*` kinds). Sender-specific checks (Emission's
    /// master-key requirement) are applied by `Transaction::verify`.
    pub fn verify_structure(&self) -> Result<()> {
        match self {
            TxData::Emission(e) => {
                if e.outs.is_empty() {
                    return Err(TxError::EmptyOuts);
                }
                for o in &e.outs {
                    if o.amount <= BigInt::zero() {
                        return Err(TxError::IncorrectAmount);
                    }
                    if o.value.is_negative() {
                        return Err(TxError::IncorrectValue);
                    }
                }
                Ok(())
            }
            TxData::Transfer(t) => {
                if t.comment.len() > MAX_TRANSFER_COMMENT {
                    return Err(TxError::LongComment);
                }
                if t.outs.is_empty() {
                    return Err(TxError::EmptyOuts);
                }
                for o in &t.outs {
                    if o.amount <= BigInt::zero() {
                        return Err(TxError::IncorrectAmount);
                    }
                }
                Ok(())
            }
            TxData::User(u) => {
                if !valid_nick(&u.nick) {
                    return Err(TxError::IncorrectNick);
                }
                Ok(())
            }
            TxData::UserUpd(u) => {
                if u.new_pub_key == [0u8; KEY_SIZE] {
                    return Err(TxError::EmptyParam);
                }
                Ok(())
            }
        }
    }

    /// Apply this payload's effect to `state` (a fresh sub-state created by
    /// the caller for the enclosing transaction).
    pub fn execute(&self, state: &State<'_>, sender: &Address) -> Result<()> {
        match self {
            TxData::Emission(e) => {
                for o in &e.outs {
                    state.increment(&e.asset, &o.address, &o.amount, 0)?;
                }
                Ok(())
            }
            TxData::Transfer(t) => {
                for o in &t.outs {
                    state.decrement(&o.asset, sender, &o.amount, o.tag)?;
                    if o.to_chain_id == state.chain_id() {
                        state.increment(&o.asset, &o.to, &o.amount, o.to_memo)?;
                    } else {
                        state.cross_chain_set(o.to_chain_id, &o.asset, &o.to, o.amount.clone(), o.to_memo)?;
                    }
                }
                Ok(())
            }
            TxData::User(_) => Ok(()),
            TxData::UserUpd(u) => state.set_auth_info(sender, &u.new_pub_key).map_err(Into::into),
        }
    }
}

/// True for the asset tag used by `AUTH` writes, so callers that scan raw
/// `StateValue`s can tell a key-rotation write apart from a balance.
pub fn is_auth_asset(asset: &[u8]) -> bool {
    asset == [ASSET_AUTH]
}

pub fn is_native(asset: &[u8]) -> bool {
    is_mdc(asset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        [b; 20]
    }

    #[test]
    fn emission_round_trips_through_encode_decode() {
        let data = TxData::Emission(Emission {
            asset: vec![1],
            comment: "genesis".into(),
            outs: vec![EmissionOutput {
                kind: 0,
                address: addr(1),
                value: BigInt::from(0),
                amount: BigInt::from(1_000_000_000u64),
            }],
        });
        let bytes = data.encode();
        let decoded = TxData::decode(data.kind(), &bytes).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn transfer_round_trips_with_multiple_outputs() {
        let data = TxData::Transfer(Transfer {
            comment: "pay".into(),
            outs: vec![
                TransferOutput {
                    asset: vec![],
                    amount: BigInt::from(100),
                    tag: 0,
                    to: addr(2),
                    to_memo: 0,
                    to_chain_id: 1,
                    comment: String::new(),
                },
                TransferOutput {
                    asset: vec![1],
                    amount: BigInt::from(5),
                    tag: 7,
                    to: addr(3),
                    to_memo: 9,
                    to_chain_id: 2,
                    comment: "cross".into(),
                },
            ],
        });
        let bytes = data.encode();
        let decoded = TxData::decode(data.kind(), &bytes).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn user_nick_validation_rejects_bad_patterns() {
        assert!(valid_nick("alice"));
        assert!(valid_nick("a1"));
        assert!(!valid_nick("Alice"));
        assert!(!valid_nick("1alice"));
        assert!(!valid_nick("ab"));
        assert!(!valid_nick(&"a".repeat(22)));
    }

    #[test]
    fn transfer_rejects_empty_outs() {
        let data = TxData::Transfer(Transfer {
            comment: String::new(),
            outs: vec![],
        });
        assert_eq!(data.verify_structure(), Err(TxError::EmptyOuts));
    }

    #[test]
    fn emission_execute_credits_each_output() {
        let root = mdc_state::EmptySource;
        let state = State::new(1, &root);
        let data = TxData::Emission(Emission {
            asset: vec![1],
            comment: String::new(),
            outs: vec![EmissionOutput {
                kind: 0,
                address: addr(9),
                value: BigInt::from(0),
                amount: BigInt::from(500),
            }],
        });
        data.execute(&state, &addr(0)).unwrap();
        assert_eq!(state.get(&[1], &addr(9)), BigInt::from(500));
    }

    #[test]
    fn transfer_execute_moves_balance_between_addresses() {
        let root = mdc_state::EmptySource;
        let state = State::new(1, &root);
        state.set(&[], &addr(1), BigInt::from(1000), 0).unwrap();
        let data = TxData::Transfer(Transfer {
            comment: String::new(),
            outs: vec![TransferOutput {
                asset: vec![],
                amount: BigInt::from(100),
                tag: 0,
                to: addr(2),
                to_memo: 0,
                to_chain_id: 1,
                comment: String::new(),
            }],
        });
        data.execute(&state, &addr(1)).unwrap();
        assert_eq!(state.get(&[], &addr(1)), BigInt::from(900));
        assert_eq!(state.get(&[], &addr(2)), BigInt::from(100));
    }

    #[test]
    fn user_upd_execute_rotates_auth_info() {
        let root = mdc_state::EmptySource;
        let state = State::new(1, &root);
        let new_key = [5u8; KEY_SIZE];
        let data = TxData::UserUpd(UserUpd { new_pub_key: new_key });
        data.execute(&state, &addr(1)).unwrap();
        assert_eq!(state.auth_info(&addr(1)), Some(new_key));
    }
}
