//! `BlockHeader` (§3 "Block", C7), grounded on
//! `qc-17-block-production/domain/entities.rs`'s `BlockHeader`, trimmed of
//! the gas/difficulty/PoW fields this ledger's single-authority design has
//! no use for and built on `mdc-codec`'s explicit wire format instead of
//! serde, since the header hash must be a byte-exact encoding subset.

use mdc_codec::{hash256, Reader, Writer};
use mdc_crypto::{PublicKey, Signature};
use mdc_trie::{merkle_root2, Hash, ZERO_HASH};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: u8,
    pub network: u32,
    pub chain_id: u64,
    pub num: u64,
    /// Microseconds since the Unix epoch.
    pub timestamp: i64,
    pub prev_hash: Hash,
    pub tx_root: Hash,
    pub state_root: Hash,
    pub chain_root: Hash,
    pub nonce: u64,
    pub miner_pub_key: PublicKey,
    pub sig: Signature,
    pub reserved1: u64,
    pub reserved2: u64,
    pub reserved3: u64,
}

impl BlockHeader {
    pub fn genesis(network: u32, chain_id: u64, timestamp: i64) -> Self {
        Self {
            version: 1,
            network,
            chain_id,
            num: 0,
            timestamp,
            prev_hash: ZERO_HASH,
            tx_root: ZERO_HASH,
            state_root: ZERO_HASH,
            chain_root: ZERO_HASH,
            nonce: 0,
            miner_pub_key: [0u8; 64],
            sig: [0u8; 64],
            reserved1: 0,
            reserved2: 0,
            reserved3: 0,
        }
    }

    /// `hash = SHA256(version, chainID, num, timestamp, prevHash, txRoot,
    /// stateRoot, nonce, minerPubKey, reserved1..3)`. `network` and
    /// `chainRoot` are deliberately excluded — `chainRoot` is itself
    /// derived from this hash via the chain trie, so including it would be
    /// circular.
    pub fn hash(&self) -> Hash {
        hash256(|w| {
            w.write_varint(self.version as i64);
            w.write_varint(self.chain_id as i64);
            w.write_varint(self.num as i64);
            w.write_time(self.timestamp);
            w.write_fixed(&self.prev_hash);
            w.write_fixed(&self.tx_root);
            w.write_fixed(&self.state_root);
            w.write_varint(self.nonce as i64);
            w.write_fixed(&self.miner_pub_key);
            w.write_varint(self.reserved1 as i64);
            w.write_varint(self.reserved2 as i64);
            w.write_varint(self.reserved3 as i64);
        })
    }

    /// The message actually signed: `merkleRoot(hash, chainRoot)`, tying
    /// the header to its position in the chain trie.
    pub fn sig_message(&self) -> Hash {
        merkle_root2(self.hash(), self.chain_root)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_varint(self.version as i64);
        w.write_varint(self.network as i64);
        w.write_varint(self.chain_id as i64);
        w.write_varint(self.num as i64);
        w.write_time(self.timestamp);
        w.write_fixed(&self.prev_hash);
        w.write_fixed(&self.tx_root);
        w.write_fixed(&self.state_root);
        w.write_fixed(&self.chain_root);
        w.write_varint(self.nonce as i64);
        w.write_fixed(&self.miner_pub_key);
        w.write_fixed(&self.sig);
        w.write_varint(self.reserved1 as i64);
        w.write_varint(self.reserved2 as i64);
        w.write_varint(self.reserved3 as i64);
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> mdc_codec::Result<Self> {
        let mut r = Reader::new(bytes);
        Ok(Self {
            version: r.read_varuint()? as u8,
            network: r.read_varuint()? as u32,
            chain_id: r.read_varuint()?,
            num: r.read_varuint()?,
            timestamp: r.read_time()?,
            prev_hash: r.read_fixed::<32>()?,
            tx_root: r.read_fixed::<32>()?,
            state_root: r.read_fixed::<32>()?,
            chain_root: r.read_fixed::<32>()?,
            nonce: r.read_varuint()?,
            miner_pub_key: r.read_fixed::<64>()?,
            sig: r.read_fixed::<64>()?,
            reserved1: r.read_varuint()?,
            reserved2: r.read_varuint()?,
            reserved3: r.read_varuint()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_round_trips() {
        let mut h = BlockHeader::genesis(1, 1, 1_700_000_000_000_000);
        h.num = 5;
        h.tx_root = [7u8; 32];
        let decoded = BlockHeader::decode(&h.encode()).unwrap();
        assert_eq!(h, decoded);
    }

    #[test]
    fn hash_excludes_network_and_chain_root() {
        let mut a = BlockHeader::genesis(1, 1, 0);
        let mut b = a.clone();
        b.network = 2;
        b.chain_root = [9u8; 32];
        assert_eq!(a.hash(), b.hash());
        a.num = 1;
        assert_ne!(a.hash(), b.hash());
    }
}
