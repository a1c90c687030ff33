//! `Block` (§3, C7): a header plus its ordered transaction list.

use crate::header::BlockHeader;
use mdc_codec::{Reader, Writer};
use mdc_trie::Hash;
use mdc_tx::Transaction;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn num(&self) -> u64 {
        self.header.num
    }

    /// Header bytes followed by the tx list, each tx framed as `Bytes` — the
    /// shape a replica fetches a batch of blocks in over the wire.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_bytes(&self.header.encode());
        w.write_slice(&self.txs, |w, tx| w.write_bytes(&tx.encode()));
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> crate::Result<Self> {
        let mut r = Reader::new(bytes);
        let header = BlockHeader::decode(&r.read_bytes()?)?;
        let count = r.read_varuint()? as usize;
        let mut txs = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            txs.push(Transaction::decode(&r.read_bytes()?)?);
        }
        Ok(Self { header, txs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrips_an_empty_block() {
        let header = BlockHeader::genesis(1, 1, 0);
        let block = Block { header, txs: vec![] };
        let decoded = Block::decode(&block.encode()).unwrap();
        assert_eq!(decoded, block);
    }
}
