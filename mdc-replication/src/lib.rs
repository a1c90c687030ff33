//! The replication loops that keep a follower node's chain and mempool in
//! sync with a remote peer (§4.8, C10).

mod error;
mod http;
mod loops;
mod remote;

pub use error::{ReplicationError, Result};
pub use http::{encode_blocks, HttpRemoteNode};
pub use loops::{spawn_block_pull_loop, spawn_mempool_push_loop};
pub use remote::RemoteNode;
