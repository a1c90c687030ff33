//! Block assembly and verification (§4.4, C7): `GenerateNewBlock`,
//! `VerifyHeader`, `VerifyBlock`. Grounded on the domain-service style of
//! `qc-17-block-production/domain/services.rs` (a stateless function over
//! injected collaborators) but built around this ledger's single-authority
//! pipeline — one miner, deterministic state-trie commitment — rather than
//! the teacher's gas-priced transaction selection.

use crate::block::Block;
use crate::error::{BlockError, Result};
use crate::header::BlockHeader;
use mdc_codec::Writer;
use mdc_crypto::{PrivateKey, PublicKey, SignatureScheme};
use mdc_state::State;
use mdc_trie::{merkle_root, Hash, PatriciaTrie, TrieDb, ZERO_HASH};
use mdc_tx::Transaction;

#[derive(Clone, Debug)]
pub struct BlockConfig {
    pub network: u32,
    pub chain_id: u64,
    pub master_pub_key: PublicKey,
}

pub struct GeneratedBlock {
    pub header: BlockHeader,
    pub txs: Vec<Transaction>,
}

/// `GenerateNewBlock` (§4.4): execute each candidate against the shared
/// block-local state in order, silently dropping txs that fail or are
/// already indexed, then commit the surviving updates to the state trie
/// and the new header to the chain trie.
#[allow(clippy::too_many_arguments)]
pub fn generate_new_block<D: TrieDb>(
    prev: &BlockHeader,
    candidates: Vec<Transaction>,
    block_state: &State<'_>,
    state_trie: &mut PatriciaTrie<'_, D>,
    state_root: &mut Hash,
    chain_trie: &mut PatriciaTrie<'_, D>,
    chain_root: &mut Hash,
    already_indexed: impl Fn(u64) -> bool,
    scheme: &dyn SignatureScheme,
    miner_priv_key: &PrivateKey,
    miner_pub_key: &PublicKey,
    timestamp: i64,
    nonce: u64,
) -> Result<Option<GeneratedBlock>> {
    let mut valid_txs = Vec::new();
    for mut tx in candidates {
        if already_indexed(tx.id()) {
            continue;
        }
        let sender_addr = scheme.derive_address(&tx.sender);
        let updates = match tx.execute(block_state, &sender_addr) {
            Ok(u) => u,
            Err(_) => continue,
        };
        if block_state.apply(&updates).is_err() {
            continue;
        }
        tx.state_updates = updates;
        valid_txs.push(tx);
    }

    if valid_txs.is_empty() {
        return Ok(None);
    }

    let mut header = BlockHeader {
        version: 1,
        network: prev.network,
        chain_id: prev.chain_id,
        num: prev.num + 1,
        timestamp,
        prev_hash: prev.hash(),
        tx_root: ZERO_HASH,
        state_root: ZERO_HASH,
        chain_root: ZERO_HASH,
        nonce,
        miner_pub_key: *miner_pub_key,
        sig: [0u8; 64],
        reserved1: 0,
        reserved2: 0,
        reserved3: 0,
    };

    for v in block_state.values() {
        if v.chain_id == header.chain_id {
            let mut w = Writer::new();
            w.write_bigint(&v.balance);
            *state_root = state_trie.put(state_root, &v.state_key(), w.into_bytes());
        }
    }
    header.state_root = *state_root;

    header.tx_root = merkle_root(
        &valid_txs.iter().map(|t| t.tx_st_hash()).collect::<Vec<_>>(),
    );

    let block_hash = header.hash();
    *chain_root = chain_trie.put(chain_root, &header.num.to_be_bytes(), block_hash.to_vec());
    header.chain_root = *chain_root;

    header.sig = scheme.sign(miner_priv_key, &header.sig_message())?;

    Ok(Some(GeneratedBlock { header, txs: valid_txs }))
}

/// `VerifyHeader` (§4.4). `prev` is `None` only when verifying the genesis
/// header itself.
pub fn verify_header(
    header: &BlockHeader,
    prev: Option<&BlockHeader>,
    cfg: &BlockConfig,
    scheme: &dyn SignatureScheme,
) -> Result<()> {
    if header.network != cfg.network {
        return Err(BlockError::InvalidNetwork);
    }
    if header.chain_id != cfg.chain_id {
        return Err(BlockError::InvalidChainId);
    }
    if let Some(prev) = prev {
        if prev.num == 0 && header == prev {
            return Err(BlockError::InvalidGenesisBlock);
        }
        if header.network != prev.network || header.chain_id != prev.chain_id {
            return Err(BlockError::InvalidNetwork);
        }
        if header.num != prev.num + 1 {
            return Err(BlockError::InvalidBlockNum);
        }
        if header.timestamp < prev.timestamp {
            return Err(BlockError::InvalidBlockTs);
        }
        if header.prev_hash != prev.hash() {
            return Err(BlockError::InvalidPrevHash);
        }
    }
    if header.miner_pub_key == [0u8; 64] {
        return Err(BlockError::EmptyMinerKey);
    }
    if header.miner_pub_key != cfg.master_pub_key {
        return Err(BlockError::InvalidMinerKey);
    }
    if !scheme.verify(&header.miner_pub_key, &header.sig_message(), &header.sig) {
        return Err(BlockError::InvalidBlockSig);
    }
    Ok(())
}

/// `VerifyBlock` (§4.4): `VerifyHeader` plus non-empty txs, matching
/// network/chain tags on every tx, and a recomputed `txRoot`.
pub fn verify_block(
    block: &Block,
    prev: Option<&BlockHeader>,
    cfg: &BlockConfig,
    scheme: &dyn SignatureScheme,
) -> Result<()> {
    verify_header(&block.header, prev, cfg, scheme)?;
    if block.txs.is_empty() {
        return Err(BlockError::EmptyBlock);
    }
    for tx in &block.txs {
        if tx.network != cfg.network {
            return Err(BlockError::InvalidNetwork);
        }
        if tx.chain_id != cfg.chain_id {
            return Err(BlockError::InvalidChainId);
        }
    }
    let recomputed = merkle_root(
        &block.txs.iter().map(|t| t.tx_st_hash()).collect::<Vec<_>>(),
    );
    if recomputed != block.header.tx_root {
        return Err(BlockError::InvalidTxsMerkleRoot);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc_crypto::{Secp256k1Scheme, SignatureScheme};
    use mdc_state::EmptySource;
    use mdc_trie::MemoryTrieDb;
    use mdc_tx::{Emission, EmissionOutput, TxData};
    use num_bigint::BigInt;

    fn emission_tx(sender: PublicKey, chain_id: u64, amount: u64, addr: [u8; 20]) -> Transaction {
        let data = TxData::Emission(Emission {
            asset: vec![1],
            comment: String::new(),
            outs: vec![EmissionOutput {
                kind: 0,
                address: addr,
                value: BigInt::from(0),
                amount: BigInt::from(amount),
            }],
        })
        .encode();
        Transaction {
            kind: 1,
            version: 1,
            network: 1,
            chain_id,
            nonce: 0,
            data,
            reserved1: 0,
            reserved2: 0,
            sender,
            sig: [0u8; 64],
            state_updates: vec![],
            block_num: 0,
            block_idx: 0,
            block_ts: 0,
        }
    }

    #[test]
    fn generate_new_block_commits_a_valid_emission() {
        let scheme = Secp256k1Scheme::new();
        let (miner_priv, miner_pub) = Secp256k1Scheme::generate();
        let prev = BlockHeader::genesis(1, 1, 0);
        let root = EmptySource;
        let state = State::new(1, &root);

        let mut tx = emission_tx(miner_pub, 1, 1_000_000_000, [9u8; 20]);
        tx.sig = scheme.sign(&miner_priv, &tx.hash()).unwrap();

        let mut state_db = MemoryTrieDb::default();
        let mut state_trie = PatriciaTrie::new(&mut state_db);
        let mut state_root = ZERO_HASH;
        let mut chain_db = MemoryTrieDb::default();
        let mut chain_trie = PatriciaTrie::new(&mut chain_db);
        let mut chain_root = ZERO_HASH;

        let generated = generate_new_block(
            &prev,
            vec![tx],
            &state,
            &mut state_trie,
            &mut state_root,
            &mut chain_trie,
            &mut chain_root,
            |_id| false,
            &scheme,
            &miner_priv,
            &miner_pub,
            1_700_000_000_000_000,
            0,
        )
        .unwrap()
        .expect("one valid tx should produce a block");

        assert_eq!(generated.txs.len(), 1);
        assert_eq!(generated.header.num, 1);
        assert_ne!(generated.header.state_root, ZERO_HASH);

        let cfg = BlockConfig {
            network: 1,
            chain_id: 1,
            master_pub_key: miner_pub,
        };
        let block = Block {
            header: generated.header,
            txs: generated.txs,
        };
        verify_block(&block, Some(&prev), &cfg, &scheme).unwrap();
    }

    #[test]
    fn generate_new_block_returns_none_when_every_tx_fails() {
        let scheme = Secp256k1Scheme::new();
        let (_, miner_pub) = Secp256k1Scheme::generate();
        let prev = BlockHeader::genesis(1, 1, 0);
        let root = EmptySource;
        let state = State::new(1, &root);

        // Sender != master key => execute() itself succeeds (execute has no
        // sender check), but verify_structure would reject it; generation
        // still drops it only if execution fails. Force a failure via an
        // insufficient-funds transfer instead.
        let data = TxData::Transfer(mdc_tx::Transfer {
            comment: String::new(),
            outs: vec![mdc_tx::TransferOutput {
                asset: vec![],
                amount: BigInt::from(1_000_000),
                tag: 0,
                to: [2u8; 20],
                to_memo: 0,
                to_chain_id: 1,
                comment: String::new(),
            }],
        })
        .encode();
        let tx = Transaction {
            kind: 2,
            version: 1,
            network: 1,
            chain_id: 1,
            nonce: 0,
            data,
            reserved1: 0,
            reserved2: 0,
            sender: miner_pub,
            sig: [0u8; 64],
            state_updates: vec![],
            block_num: 0,
            block_idx: 0,
            block_ts: 0,
        };

        let mut state_db = MemoryTrieDb::default();
        let mut state_trie = PatriciaTrie::new(&mut state_db);
        let mut state_root = ZERO_HASH;
        let mut chain_db = MemoryTrieDb::default();
        let mut chain_trie = PatriciaTrie::new(&mut chain_db);
        let mut chain_root = ZERO_HASH;

        let (miner_priv, _) = Secp256k1Scheme::generate();
        let result = generate_new_block(
            &prev,
            vec![tx],
            &state,
            &mut state_trie,
            &mut state_root,
            &mut chain_trie,
            &mut chain_root,
            |_id| false,
            &scheme,
            &miner_priv,
            &miner_pub,
            0,
            0,
        )
        .unwrap();
        assert!(result.is_none());
    }
}
