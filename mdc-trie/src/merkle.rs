//! Binary Merkle root (spec §3, §4.4): used both for a block's transaction
//! list and for the small fixed pairings `merkleRoot(hash, stateHash)` that
//! tie a transaction's own hash to its state-update hash, and a block's
//! header hash to its chain-trie root before signing.

use sha2::{Digest, Sha256};

pub type Hash = [u8; 32];

pub const ZERO_HASH: Hash = [0u8; 32];

fn combine(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Root of the binary Merkle tree over `leaves`, in order. An odd node at
/// any level is promoted unchanged to the level above rather than
/// duplicated, so the tree shape is fully determined by the leaf count.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return ZERO_HASH;
    }
    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut i = 0;
        while i < level.len() {
            if i + 1 < level.len() {
                next.push(combine(&level[i], &level[i + 1]));
            } else {
                next.push(level[i]);
            }
            i += 2;
        }
        level = next;
    }
    level[0]
}

/// Convenience for the spec's common two-value pairing,
/// `merkleRoot(a, b)`.
pub fn merkle_root2(a: Hash, b: Hash) -> Hash {
    merkle_root(&[a, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero_hash() {
        assert_eq!(merkle_root(&[]), ZERO_HASH);
    }

    #[test]
    fn single_leaf_is_itself() {
        let leaf = [7u8; 32];
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn deterministic_for_same_input() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32]];
        assert_eq!(merkle_root(&leaves), merkle_root(&leaves));
    }

    #[test]
    fn order_sensitive() {
        let a = merkle_root(&[[1u8; 32], [2u8; 32]]);
        let b = merkle_root(&[[2u8; 32], [1u8; 32]]);
        assert_ne!(a, b);
    }
}
