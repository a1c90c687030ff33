//! Key layout for the chain storage namespace (§4.5): one byte-prefixed
//! entity per table/index, keyed so that lexicographic byte order matches
//! the documented iteration order (numeric fields big-endian, strings
//! `bytes ‖ 0x00`), grounded on
//! `qc-02-block-storage/domain/types/config.rs`'s `KeyPrefix` (`b"b:"`,
//! `b"h:"`, ... `+ suffix`) generalized to the richer entity/index table
//! this ledger actually needs.

pub const HEADERS: u8 = 0x01;
pub const TXS: u8 = 0x02;
pub const CHAIN_TREE: u8 = 0x03;
pub const STATE_TREE: u8 = 0x04;
pub const STAT: u8 = 0x05;
pub const IDX_TX_ID: u8 = 0x20;
pub const IDX_ASSET: u8 = 0x21;
pub const IDX_ASSET_ADDR: u8 = 0x22;
pub const IDX_ASSET_ADDR_MEMO: u8 = 0x23;
pub const IDX_USER_ID: u8 = 0x24;
pub const IDX_USER_NICK: u8 = 0x25;
pub const IDX_INVITES: u8 = 0x27;

fn with_entity(entity: u8, capacity_hint: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + capacity_hint);
    key.push(entity);
    key
}

fn push_str_part(key: &mut Vec<u8>, s: &[u8]) {
    key.extend_from_slice(s);
    key.push(0);
}

pub fn header_key(block_num: u64) -> Vec<u8> {
    let mut key = with_entity(HEADERS, 8);
    key.extend_from_slice(&block_num.to_be_bytes());
    key
}

pub fn tx_key(block_num: u64, tx_idx: u32) -> Vec<u8> {
    let mut key = with_entity(TXS, 12);
    key.extend_from_slice(&block_num.to_be_bytes());
    key.extend_from_slice(&tx_idx.to_be_bytes());
    key
}

pub fn node_key(entity: u8, hash: &[u8; 32]) -> Vec<u8> {
    let mut key = with_entity(entity, 32);
    key.extend_from_slice(hash);
    key
}

pub fn stat_key(timestamp: i64, block_num: u64) -> Vec<u8> {
    let mut key = with_entity(STAT, 16);
    key.extend_from_slice(&(timestamp as u64).to_be_bytes());
    key.extend_from_slice(&block_num.to_be_bytes());
    key
}

pub fn idx_tx_id_key(tx_id: u64) -> Vec<u8> {
    let mut key = with_entity(IDX_TX_ID, 8);
    key.extend_from_slice(&tx_id.to_be_bytes());
    key
}

pub fn idx_asset_key(asset: &[u8], tx_uid: u64) -> Vec<u8> {
    let mut key = with_entity(IDX_ASSET, asset.len() + 9);
    push_str_part(&mut key, asset);
    key.extend_from_slice(&tx_uid.to_be_bytes());
    key
}

pub fn idx_asset_addr_prefix(asset: &[u8], addr: &[u8; 20]) -> Vec<u8> {
    let mut key = with_entity(IDX_ASSET_ADDR, asset.len() + 1 + 20);
    push_str_part(&mut key, asset);
    key.extend_from_slice(addr);
    key
}

pub fn idx_asset_addr_key(asset: &[u8], addr: &[u8; 20], tx_uid: u64, st_idx: u32) -> Vec<u8> {
    let mut key = idx_asset_addr_prefix(asset, addr);
    key.extend_from_slice(&tx_uid.to_be_bytes());
    key.extend_from_slice(&st_idx.to_be_bytes());
    key
}

pub fn idx_asset_addr_memo_prefix(asset: &[u8], addr: &[u8; 20], memo: u64) -> Vec<u8> {
    let mut key = with_entity(IDX_ASSET_ADDR_MEMO, asset.len() + 1 + 20 + 8);
    push_str_part(&mut key, asset);
    key.extend_from_slice(addr);
    key.extend_from_slice(&memo.to_be_bytes());
    key
}

pub fn idx_asset_addr_memo_key(
    asset: &[u8],
    addr: &[u8; 20],
    memo: u64,
    tx_uid: u64,
    st_idx: u32,
) -> Vec<u8> {
    let mut key = idx_asset_addr_memo_prefix(asset, addr, memo);
    key.extend_from_slice(&tx_uid.to_be_bytes());
    key.extend_from_slice(&st_idx.to_be_bytes());
    key
}

pub fn idx_user_id_key(user_id: u64) -> Vec<u8> {
    let mut key = with_entity(IDX_USER_ID, 8);
    key.extend_from_slice(&user_id.to_be_bytes());
    key
}

pub fn idx_user_nick_key(nick: &str) -> Vec<u8> {
    let mut key = with_entity(IDX_USER_NICK, nick.len() + 1);
    push_str_part(&mut key, nick.as_bytes());
    key
}

pub fn idx_invites_prefix(referrer_id: u64) -> Vec<u8> {
    let mut key = with_entity(IDX_INVITES, 8);
    key.extend_from_slice(&referrer_id.to_be_bytes());
    key
}

pub fn idx_invites_key(referrer_id: u64, tx_uid: u64) -> Vec<u8> {
    let mut key = idx_invites_prefix(referrer_id);
    key.extend_from_slice(&tx_uid.to_be_bytes());
    key
}

/// `txUID = (blockNum << 32) | txIdx` (GLOSSARY).
pub fn tx_uid(block_num: u64, tx_idx: u32) -> u64 {
    (block_num << 32) | tx_idx as u64
}

pub fn tx_uid_parts(tx_uid: u64) -> (u64, u32) {
    (tx_uid >> 32, tx_uid as u32)
}
