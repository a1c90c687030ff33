//! The state overlay itself (C5, §4.2): a parent-chained balance cache plus
//! an append-only update log, grounded on
//! `qc-04-state-management/domain/cache.rs`'s `VersionedAccountCache` —
//! same "cache read, tag write, never mutate a reachable parent" shape —
//! but keyed by `(asset, address)` rather than `(address, block hash)`,
//! since this cache's job is memoizing lookups within one execution rather
//! than surviving reorgs.

use crate::entities::{Address, Asset, StateValue};
use crate::error::{Result, StateError};
use num_bigint::BigInt;
use num_traits::Zero;
use std::cell::RefCell;
use std::collections::HashMap;

/// Anything that can answer "what is the balance of `(asset, address)` right
/// now" — a parent `State`, or (at the root) a trie-backed reader owned by
/// `mdc-chain`.
pub trait BalanceSource {
    fn balance_of(&self, asset: &[u8], address: &Address) -> BigInt;
}

/// A balance source with no data of its own; the root of a fresh chain.
pub struct EmptySource;

impl BalanceSource for EmptySource {
    fn balance_of(&self, _asset: &[u8], _address: &Address) -> BigInt {
        BigInt::zero()
    }
}

pub struct State<'p> {
    chain_id: u64,
    parent: &'p dyn BalanceSource,
    cache: RefCell<HashMap<(Asset, Address), BigInt>>,
    updates: RefCell<Vec<StateValue>>,
}

impl<'p> State<'p> {
    pub fn new(chain_id: u64, parent: &'p dyn BalanceSource) -> Self {
        Self {
            chain_id,
            parent,
            cache: RefCell::new(HashMap::new()),
            updates: RefCell::new(Vec::new()),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Current balance, loading from the parent and memoizing on first read.
    pub fn get(&self, asset: &[u8], address: &Address) -> BigInt {
        let key = (asset.to_vec(), *address);
        if let Some(balance) = self.cache.borrow().get(&key) {
            return balance.clone();
        }
        let balance = self.parent.balance_of(asset, address);
        self.cache.borrow_mut().insert(key, balance.clone());
        balance
    }

    /// Append a `StateValue` for this state's own `chainID`; updates the
    /// cache so a subsequent `get` observes it.
    pub fn set(&self, asset: &[u8], address: &Address, balance: BigInt, memo: u64) -> Result<()> {
        self.record(self.chain_id, asset, address, balance, memo)
    }

    /// Append a `StateValue` under a foreign `chainID`; the local cache is
    /// left untouched, since this value settles on another chain.
    pub fn cross_chain_set(
        &self,
        chain_id: u64,
        asset: &[u8],
        address: &Address,
        balance: BigInt,
        memo: u64,
    ) -> Result<()> {
        self.record(chain_id, asset, address, balance, memo)
    }

    fn record(&self, chain_id: u64, asset: &[u8], address: &Address, balance: BigInt, memo: u64) -> Result<()> {
        if balance < BigInt::zero() {
            return Err(StateError::NegativeBalance);
        }
        if chain_id == self.chain_id {
            self.cache
                .borrow_mut()
                .insert((asset.to_vec(), *address), balance.clone());
        }
        self.updates.borrow_mut().push(StateValue::new(
            chain_id,
            asset.to_vec(),
            *address,
            balance,
            memo,
        ));
        Ok(())
    }

    pub fn increment(&self, asset: &[u8], address: &Address, delta: &BigInt, memo: u64) -> Result<()> {
        if delta.is_zero() {
            return Ok(());
        }
        let next = self.get(asset, address) + delta;
        self.set(asset, address, next, memo)
    }

    pub fn decrement(&self, asset: &[u8], address: &Address, delta: &BigInt, memo: u64) -> Result<()> {
        if delta.is_zero() {
            return Ok(());
        }
        let next = self.get(asset, address) - delta;
        self.set(asset, address, next, memo)
    }

    /// The ordered log of every `set`/`cross_chain_set` call so far — the
    /// authoritative `stateUpdates` of the transaction being executed.
    pub fn values(&self) -> Vec<StateValue> {
        self.updates.borrow().clone()
    }

    /// A child overlay whose parent lookup is this state's own `get`. Its
    /// updates are independent until the caller explicitly applies them.
    pub fn new_sub_state(&self) -> State<'_> {
        State::new(self.chain_id, self)
    }

    /// Merge `updates` into this state as if each had been `set`/
    /// `cross_chain_set` directly. Used to fold a successful sub-state's
    /// effects into its parent after execution.
    pub fn apply(&self, updates: &[StateValue]) -> Result<()> {
        for v in updates {
            self.record(v.chain_id, &v.asset, &v.address, v.balance.clone(), v.memo)?;
        }
        Ok(())
    }
}

impl<'p> BalanceSource for State<'p> {
    fn balance_of(&self, asset: &[u8], address: &Address) -> BigInt {
        self.get(asset, address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        [byte; 20]
    }

    #[test]
    fn get_defaults_to_zero_with_no_parent_data() {
        let root = EmptySource;
        let state = State::new(1, &root);
        assert_eq!(state.get(b"", &addr(1)), BigInt::zero());
    }

    #[test]
    fn set_negative_balance_is_rejected() {
        let root = EmptySource;
        let state = State::new(1, &root);
        let err = state.set(b"", &addr(1), BigInt::from(-1), 0).unwrap_err();
        assert_eq!(err, StateError::NegativeBalance);
    }

    #[test]
    fn increment_then_get_reflects_new_balance() {
        let root = EmptySource;
        let state = State::new(1, &root);
        state.increment(b"", &addr(1), &BigInt::from(100), 0).unwrap();
        assert_eq!(state.get(b"", &addr(1)), BigInt::from(100));
    }

    #[test]
    fn cross_chain_set_does_not_touch_local_cache() {
        let root = EmptySource;
        let state = State::new(1, &root);
        state
            .cross_chain_set(2, b"", &addr(1), BigInt::from(50), 0)
            .unwrap();
        assert_eq!(state.get(b"", &addr(1)), BigInt::zero());
        assert_eq!(state.values().len(), 1);
        assert_eq!(state.values()[0].chain_id, 2);
    }

    #[test]
    fn sub_state_sees_parent_balance_and_applies_back() {
        let root = EmptySource;
        let parent = State::new(1, &root);
        parent.set(b"", &addr(1), BigInt::from(1000), 0).unwrap();

        let sub = parent.new_sub_state();
        assert_eq!(sub.get(b"", &addr(1)), BigInt::from(1000));
        sub.decrement(b"", &addr(1), &BigInt::from(100), 0).unwrap();
        assert_eq!(sub.get(b"", &addr(1)), BigInt::from(900));

        // Parent is untouched until the caller explicitly applies sub's log.
        assert_eq!(parent.get(b"", &addr(1)), BigInt::from(1000));
        parent.apply(&sub.values()).unwrap();
        assert_eq!(parent.get(b"", &addr(1)), BigInt::from(900));
    }

    #[test]
    fn failed_sub_state_is_never_merged() {
        let root = EmptySource;
        let parent = State::new(1, &root);
        parent.set(b"", &addr(1), BigInt::from(100), 0).unwrap();

        let sub = parent.new_sub_state();
        let result = sub.decrement(b"", &addr(1), &BigInt::from(1000), 0);
        assert!(result.is_err());
        // Caller discards `sub` entirely; parent balance is untouched.
        assert_eq!(parent.get(b"", &addr(1)), BigInt::from(100));
    }
}
