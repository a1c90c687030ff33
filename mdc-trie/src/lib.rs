//! Merkle / Patricia primitives (C3): a binary Merkle root helper for
//! transaction lists, and an authenticated radix trie for the state and
//! chain tries.

pub mod merkle;
pub mod nibbles;
pub mod patricia;

pub use merkle::{merkle_root, merkle_root2, Hash, ZERO_HASH};
pub use nibbles::Nibbles;
pub use patricia::{MemoryTrieDb, PatriciaTrie, TrieDb};
