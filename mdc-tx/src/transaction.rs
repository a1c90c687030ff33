//! The `Transaction` envelope (§3, §4.3, C6): header fields signed over a
//! fixed order, a separately-framed payload, and the execution protocol
//! that ties a tx to the `stateUpdates` it claims to have produced.
//!
//! Grounded on `qc-12-transaction-ordering/domain/entities.rs`'s
//! transaction/hash/id shape, re-keyed to this ledger's own signed-field
//! order and its `mdc-codec` wire format instead of the teacher's
//! serde+bincode envelope — signing must be over a byte-exact,
//! cross-language-stable encoding, which only the explicit codec gives us.

use crate::error::{Result, TxError};
use crate::payload::TxData;
use mdc_codec::{hash256, tx_id_by_hash, Reader, Writer};
use mdc_crypto::{PublicKey, Signature, SignatureScheme};
use mdc_state::{Address, StateValue};
use mdc_trie::{merkle_root2, Hash};
use num_bigint::BigInt;

pub const MAX_DATA_LEN: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub kind: u8,
    pub version: u8,
    pub network: u32,
    pub chain_id: u64,
    pub nonce: u64,
    pub data: Vec<u8>,
    pub reserved1: u64,
    pub reserved2: u64,
    pub sender: PublicKey,
    pub sig: Signature,
    pub state_updates: Vec<StateValue>,
    /// Block-binding fields: not part of the signed payload, filled in
    /// when the tx is placed in a block or loaded back from storage.
    pub block_num: u64,
    pub block_idx: u32,
    pub block_ts: i64,
}

fn write_state_value<S: mdc_codec::Sink>(w: &mut Writer<S>, v: &StateValue) {
    w.write_varint(v.chain_id as i64);
    w.write_bytes(&v.asset);
    w.write_fixed(&v.address);
    w.write_bigint(&v.balance);
    w.write_varint(v.memo as i64);
}

fn read_state_value(r: &mut Reader) -> Result<StateValue> {
    Ok(StateValue::new(
        r.read_varuint()?,
        r.read_bytes()?,
        r.read_fixed::<20>()?,
        r.read_bigint()?,
        r.read_varuint()?,
    ))
}

impl Transaction {
    /// `hash = SHA256(encode(type, version, network, chainID, nonce,
    /// sender, data, reserved1, reserved2))` — the bytes that get signed.
    pub fn hash(&self) -> Hash {
        hash256(|w| {
            w.write_u8(self.kind);
            w.write_varint(self.version as i64);
            w.write_varint(self.network as i64);
            w.write_varint(self.chain_id as i64);
            w.write_varint(self.nonce as i64);
            w.write_fixed(&self.sender);
            w.write_bytes(&self.data);
            w.write_varint(self.reserved1 as i64);
            w.write_varint(self.reserved2 as i64);
        })
    }

    pub fn id(&self) -> u64 {
        tx_id_by_hash(&self.hash())
    }

    fn state_updates_hash(&self) -> Hash {
        hash256(|w| {
            w.write_slice(&self.state_updates, |w, v| write_state_value(w, v));
        })
    }

    /// `txStHash = merkleRoot(hash, stateUpdates.hash())`, the leaf fed
    /// into a block's transaction Merkle root.
    pub fn tx_st_hash(&self) -> Hash {
        merkle_root2(self.hash(), self.state_updates_hash())
    }

    /// Disk/wire layout: `(type, version, network, chainID, nonce, data,
    /// reserved1, reserved2, sender, sig, stateUpdates)`.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u8(self.kind);
        w.write_varint(self.version as i64);
        w.write_varint(self.network as i64);
        w.write_varint(self.chain_id as i64);
        w.write_varint(self.nonce as i64);
        w.write_bytes(&self.data);
        w.write_varint(self.reserved1 as i64);
        w.write_varint(self.reserved2 as i64);
        w.write_fixed(&self.sender);
        w.write_fixed(&self.sig);
        w.write_slice(&self.state_updates, |w, v| write_state_value(w, v));
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let kind = r.read_u8()?;
        let version = r.read_varuint()? as u8;
        let network = r.read_varuint()? as u32;
        let chain_id = r.read_varuint()?;
        let nonce = r.read_varuint()?;
        let data = r.read_bytes()?;
        let reserved1 = r.read_varuint()?;
        let reserved2 = r.read_varuint()?;
        let sender = r.read_fixed::<64>()?;
        let sig = r.read_fixed::<64>()?;
        let state_updates = r.read_slice(read_state_value)?;
        Ok(Transaction {
            kind,
            version,
            network,
            chain_id,
            nonce,
            data,
            reserved1,
            reserved2,
            sender,
            sig,
            state_updates,
            block_num: 0,
            block_idx: 0,
            block_ts: 0,
        })
    }

    /// Stamp the block-binding fields on load/inclusion. Not part of the
    /// signed hash.
    pub fn bind_to_block(&mut self, block_num: u64, block_idx: u32, block_ts: i64) {
        self.block_num = block_num;
        self.block_idx = block_idx;
        self.block_ts = block_ts;
    }
}

/// Parameters a tx is checked against, independent of the chain's current
/// tip (network/chain tags, the master key used for Emission and genesis
/// signatures).
pub struct VerifyConfig {
    pub network: u32,
    pub chain_id: u64,
    pub master_pub_key: PublicKey,
}

impl Transaction {
    /// Structural + policy checks that don't require chain state: size and
    /// tag checks, payload decoding and its own structural rules, and (for
    /// `Emission`) the master-key sender requirement. Returns the decoded
    /// payload so callers don't have to decode it twice.
    pub fn verify_structure(&self, cfg: &VerifyConfig) -> Result<TxData> {
        if self.sender == [0u8; 64] {
            return Err(TxError::EmptySender);
        }
        if self.data.is_empty() {
            return Err(TxError::EmptyData);
        }
        if self.data.len() > MAX_DATA_LEN {
            return Err(TxError::DataTooLong);
        }
        if self.network != cfg.network {
            return Err(TxError::InvalidNetworkId);
        }
        if self.chain_id != cfg.chain_id {
            return Err(TxError::InvalidChainId);
        }
        let payload = TxData::decode(self.kind, &self.data).map_err(|_| TxError::InvalidData)?;
        payload.verify_structure()?;
        if matches!(payload, TxData::Emission(_)) && self.sender != cfg.master_pub_key {
            return Err(TxError::IncorrectSender);
        }
        Ok(payload)
    }

    /// Signature discipline (§4.3): the caller resolves `effective_pub_key`
    /// as `state.authInfo(senderAddr).unwrap_or(tx.sender)`, or — in the
    /// genesis block only — the configured master key as a fallback.
    pub fn verify_signature(&self, scheme: &dyn SignatureScheme, effective_pub_key: &PublicKey) -> Result<()> {
        if scheme.verify(effective_pub_key, &self.hash(), &self.sig) {
            Ok(())
        } else {
            Err(TxError::InvalidSignature)
        }
    }

    /// Run the payload's `execute` against a fresh sub-state of `parent`
    /// and return the resulting `stateUpdates` (step 1-2 of §4.3's execute
    /// protocol). The caller compares these against `self.state_updates`
    /// (step 3) and applies them to `parent` on success (step 4).
    pub fn execute(&self, parent: &mdc_state::State<'_>, sender_addr: &Address) -> Result<Vec<StateValue>> {
        let payload = TxData::decode(self.kind, &self.data).map_err(|_| TxError::InvalidData)?;
        let sub = parent.new_sub_state();
        payload.execute(&sub, sender_addr)?;
        Ok(sub.values())
    }

    /// Step 3 of the execute protocol: the sender-supplied `stateUpdates`
    /// must equal what re-execution produces, value for value and in order.
    pub fn state_updates_match(&self, computed: &[StateValue]) -> bool {
        self.state_updates == computed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Emission, EmissionOutput, TxData};

    fn sample_tx() -> Transaction {
        let data = TxData::Emission(Emission {
            asset: vec![1],
            comment: "g".into(),
            outs: vec![EmissionOutput {
                kind: 0,
                address: [9u8; 20],
                value: BigInt::from(0),
                amount: BigInt::from(10),
            }],
        })
        .encode();
        Transaction {
            kind: 1,
            version: 1,
            network: 1,
            chain_id: 1,
            nonce: 0,
            data,
            reserved1: 0,
            reserved2: 0,
            sender: [3u8; 64],
            sig: [0u8; 64],
            state_updates: vec![],
            block_num: 0,
            block_idx: 0,
            block_ts: 0,
        }
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let tx = sample_tx();
        let decoded = Transaction::decode(&tx.encode()).unwrap();
        assert_eq!(tx.kind, decoded.kind);
        assert_eq!(tx.data, decoded.data);
        assert_eq!(tx.sender, decoded.sender);
        assert_eq!(tx.hash(), decoded.hash());
    }

    #[test]
    fn id_is_first_eight_bytes_of_hash() {
        let tx = sample_tx();
        let hash = tx.hash();
        let expected = u64::from_be_bytes(hash[0..8].try_into().unwrap());
        assert_eq!(tx.id(), expected);
    }

    #[test]
    fn hash_changes_when_data_changes() {
        let mut tx = sample_tx();
        let h1 = tx.hash();
        tx.nonce = 1;
        assert_ne!(h1, tx.hash());
    }

    #[test]
    fn verify_structure_rejects_empty_sender() {
        let mut tx = sample_tx();
        tx.sender = [0u8; 64];
        let cfg = VerifyConfig {
            network: 1,
            chain_id: 1,
            master_pub_key: [3u8; 64],
        };
        assert_eq!(tx.verify_structure(&cfg), Err(TxError::EmptySender));
    }

    #[test]
    fn verify_structure_rejects_emission_from_non_master_sender() {
        let tx = sample_tx();
        let cfg = VerifyConfig {
            network: 1,
            chain_id: 1,
            master_pub_key: [7u8; 64],
        };
        assert_eq!(tx.verify_structure(&cfg), Err(TxError::IncorrectSender));
    }

    #[test]
    fn execute_then_match_round_trips_emission() {
        let tx = sample_tx();
        let root = mdc_state::EmptySource;
        let state = mdc_state::State::new(1, &root);
        let updates = tx.execute(&state, &[0u8; 20]).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].address, [9u8; 20]);
        assert_eq!(updates[0].balance, BigInt::from(10));
    }
}
