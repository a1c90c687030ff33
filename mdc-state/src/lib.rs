//! State overlay (C5): a parent-chained balance cache with an append-only
//! update log. `mdc-tx` executes payloads against a `State`; `mdc-chain`
//! supplies the root `BalanceSource` backed by the persistent state trie.

pub mod auth;
pub mod entities;
pub mod error;
pub mod overlay;

pub use auth::KEY_SIZE;
pub use entities::{is_mdc, Address, Asset, StateValue, ASSET_AUTH, ASSET_MDC};
pub use error::{Result, StateError};
pub use overlay::{BalanceSource, EmptySource, State};
