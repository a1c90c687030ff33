//! Authenticated radix (Patricia/Merkle) trie with a pluggable persistent
//! storage backend, grounded on
//! `qc-04-state-management/domain/{trie,node,nibbles}.rs`'s node-by-hash
//! design, but keyed by SHA-256 (matching the rest of the core's hashing)
//! rather than Keccak256, and generalized over an injected `TrieDb` so the
//! same implementation backs both the state trie (`address ‖ asset →
//! balance bytes`) and the chain trie (`blockNum → blockHash`).

use crate::merkle::{Hash, ZERO_HASH};
use crate::nibbles::Nibbles;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        path: Vec<u8>,
        value: Vec<u8>,
    },
    Extension {
        path: Vec<u8>,
        child: Hash,
    },
    Branch {
        children: [Option<Hash>; 16],
        value: Option<Vec<u8>>,
    },
}

fn hash_node(node: &Node) -> Hash {
    let bytes = bincode::serialize(node).expect("node serialization is infallible");
    Sha256::digest(bytes).into()
}

/// Storage backend for trie nodes, keyed by their content hash. An
/// in-memory `HashMap` satisfies this for tests; `mdc-chain` backs it with
/// the `OrderedKV` capability for production persistence.
pub trait TrieDb {
    fn get_node(&self, hash: &Hash) -> Option<Vec<u8>>;
    fn put_node(&mut self, hash: Hash, data: Vec<u8>);
}

#[derive(Debug, Default)]
pub struct MemoryTrieDb(std::collections::HashMap<Hash, Vec<u8>>);

impl TrieDb for MemoryTrieDb {
    fn get_node(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.0.get(hash).cloned()
    }

    fn put_node(&mut self, hash: Hash, data: Vec<u8>) {
        self.0.insert(hash, data);
    }
}

/// A trie is addressed purely by its root hash; all mutation happens
/// through `put`, which returns the new root without disturbing nodes
/// reachable from prior roots (content-addressed structural sharing).
pub struct PatriciaTrie<'a, D: TrieDb> {
    db: &'a mut D,
}

impl<'a, D: TrieDb> PatriciaTrie<'a, D> {
    pub fn new(db: &'a mut D) -> Self {
        Self { db }
    }

    fn load(&self, hash: &Hash) -> Option<Node> {
        if *hash == ZERO_HASH {
            return None;
        }
        let bytes = self.db.get_node(hash)?;
        bincode::deserialize(&bytes).ok()
    }

    fn store(&mut self, node: &Node) -> Hash {
        let hash = hash_node(node);
        let bytes = bincode::serialize(node).expect("node serialization is infallible");
        self.db.put_node(hash, bytes);
        hash
    }

    pub fn get(&self, root: &Hash, key: &[u8]) -> Option<Vec<u8>> {
        let path = Nibbles::from_bytes(key);
        self.get_at(root, &path)
    }

    fn get_at(&self, node_hash: &Hash, path: &Nibbles) -> Option<Vec<u8>> {
        let node = self.load(node_hash)?;
        match node {
            Node::Leaf {
                path: node_path,
                value,
            } => {
                if node_path == path.0 {
                    Some(value)
                } else {
                    None
                }
            }
            Node::Extension {
                path: node_path,
                child,
            } => {
                if path.0.len() >= node_path.len() && path.0[..node_path.len()] == node_path[..] {
                    self.get_at(&child, &path.slice(node_path.len()))
                } else {
                    None
                }
            }
            Node::Branch { children, value } => {
                if path.is_empty() {
                    return value;
                }
                let idx = path.0[0] as usize;
                match &children[idx] {
                    Some(child) => self.get_at(child, &path.slice(1)),
                    None => None,
                }
            }
        }
    }

    /// Insert/overwrite `key` and return the trie's new root.
    pub fn put(&mut self, root: &Hash, key: &[u8], value: Vec<u8>) -> Hash {
        let path = Nibbles::from_bytes(key);
        self.put_at(root, &path, value)
    }

    fn put_at(&mut self, node_hash: &Hash, path: &Nibbles, value: Vec<u8>) -> Hash {
        let Some(node) = self.load(node_hash) else {
            return self.store(&Node::Leaf {
                path: path.0.clone(),
                value,
            });
        };
        match node {
            Node::Leaf {
                path: node_path,
                value: old_value,
            } => self.put_into_leaf(node_path, old_value, path, value),
            Node::Extension {
                path: node_path,
                child,
            } => self.put_into_extension(node_path, child, path, value),
            Node::Branch {
                mut children,
                value: branch_value,
            } => {
                if path.is_empty() {
                    return self.store(&Node::Branch {
                        children,
                        value: Some(value),
                    });
                }
                let idx = path.0[0] as usize;
                let rest = path.slice(1);
                let new_child = match children[idx] {
                    Some(child) => self.put_at(&child, &rest, value),
                    None => self.store_leaf(&rest, value),
                };
                children[idx] = Some(new_child);
                self.store(&Node::Branch {
                    children,
                    value: branch_value,
                })
            }
        }
    }

    fn store_leaf(&mut self, path: &Nibbles, value: Vec<u8>) -> Hash {
        self.store(&Node::Leaf {
            path: path.0.clone(),
            value,
        })
    }

    fn put_into_leaf(
        &mut self,
        node_path: Vec<u8>,
        old_value: Vec<u8>,
        path: &Nibbles,
        value: Vec<u8>,
    ) -> Hash {
        if node_path == path.0 {
            return self.store(&Node::Leaf { path: node_path, value });
        }
        let existing = Nibbles(node_path);
        let common = existing.common_prefix_len(path);
        let mut children: [Option<Hash>; 16] = Default::default();
        let mut branch_value = None;

        if existing.len() == common {
            branch_value = Some(old_value);
        } else {
            let idx = existing.0[common] as usize;
            let leaf = self.store_leaf(&existing.slice(common + 1), old_value);
            children[idx] = Some(leaf);
        }

        if path.len() == common {
            branch_value = Some(value);
        } else {
            let idx = path.0[common] as usize;
            let leaf = self.store_leaf(&path.slice(common + 1), value);
            children[idx] = Some(leaf);
        }

        let branch = self.store(&Node::Branch {
            children,
            value: branch_value,
        });

        if common == 0 {
            branch
        } else {
            self.store(&Node::Extension {
                path: existing.0[..common].to_vec(),
                child: branch,
            })
        }
    }

    fn put_into_extension(
        &mut self,
        node_path: Vec<u8>,
        child: Hash,
        path: &Nibbles,
        value: Vec<u8>,
    ) -> Hash {
        let ext_path = Nibbles(node_path.clone());
        if path.0.len() >= node_path.len() && path.0[..node_path.len()] == node_path[..] {
            let new_child = self.put_at(&child, &path.slice(node_path.len()), value);
            return self.store(&Node::Extension {
                path: node_path,
                child: new_child,
            });
        }

        let common = ext_path.common_prefix_len(path);
        let mut children: [Option<Hash>; 16] = Default::default();

        let remaining_ext = ext_path.slice(common + 1);
        let ext_branch_child = if remaining_ext.is_empty() {
            child
        } else {
            self.store(&Node::Extension {
                path: remaining_ext.0,
                child,
            })
        };
        children[ext_path.0[common] as usize] = Some(ext_branch_child);

        let mut branch_value = None;
        if path.len() == common {
            branch_value = Some(value);
        } else {
            let idx = path.0[common] as usize;
            let leaf = self.store_leaf(&path.slice(common + 1), value);
            children[idx] = Some(leaf);
        }

        let branch = self.store(&Node::Branch {
            children,
            value: branch_value,
        });

        if common == 0 {
            branch
        } else {
            self.store(&Node::Extension {
                path: ext_path.0[..common].to_vec(),
                child: branch,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_single_key() {
        let mut db = MemoryTrieDb::default();
        let mut trie = PatriciaTrie::new(&mut db);
        let root = trie.put(&ZERO_HASH, b"hello", b"world".to_vec());
        assert_eq!(trie.get(&root, b"hello"), Some(b"world".to_vec()));
    }

    #[test]
    fn missing_key_returns_none() {
        let mut db = MemoryTrieDb::default();
        let mut trie = PatriciaTrie::new(&mut db);
        let root = trie.put(&ZERO_HASH, b"hello", b"world".to_vec());
        assert_eq!(trie.get(&root, b"nope"), None);
    }

    #[test]
    fn multiple_keys_with_shared_prefix() {
        let mut db = MemoryTrieDb::default();
        let mut trie = PatriciaTrie::new(&mut db);
        let mut root = ZERO_HASH;
        root = trie.put(&root, b"apple", b"1".to_vec());
        root = trie.put(&root, b"apricot", b"2".to_vec());
        root = trie.put(&root, b"banana", b"3".to_vec());

        assert_eq!(trie.get(&root, b"apple"), Some(b"1".to_vec()));
        assert_eq!(trie.get(&root, b"apricot"), Some(b"2".to_vec()));
        assert_eq!(trie.get(&root, b"banana"), Some(b"3".to_vec()));
    }

    #[test]
    fn overwrite_existing_key() {
        let mut db = MemoryTrieDb::default();
        let mut trie = PatriciaTrie::new(&mut db);
        let mut root = trie.put(&ZERO_HASH, b"k", b"v1".to_vec());
        root = trie.put(&root, b"k", b"v2".to_vec());
        assert_eq!(trie.get(&root, b"k"), Some(b"v2".to_vec()));
    }

    #[test]
    fn root_is_deterministic_regardless_of_insertion_order() {
        let mut db1 = MemoryTrieDb::default();
        let mut t1 = PatriciaTrie::new(&mut db1);
        let mut r1 = ZERO_HASH;
        r1 = t1.put(&r1, b"a", b"1".to_vec());
        r1 = t1.put(&r1, b"b", b"2".to_vec());

        let mut db2 = MemoryTrieDb::default();
        let mut t2 = PatriciaTrie::new(&mut db2);
        let mut r2 = ZERO_HASH;
        r2 = t2.put(&r2, b"b", b"2".to_vec());
        r2 = t2.put(&r2, b"a", b"1".to_vec());

        assert_eq!(r1, r2);
    }
}
