//! In-memory `RawKv` for tests, grounded on
//! `qc-02-block-storage/ports/outbound.rs`'s `InMemoryKVStore`.

use crate::error::Result;
use crate::traits::{BatchOp, RawKv};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryKv {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RawKv for MemoryKv {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let mut data = self.data.write();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8], desc: bool) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let data = self.data.read();
        let mut out: Vec<(Vec<u8>, Vec<u8>)> = data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if desc {
            out.reverse();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips() {
        let kv = MemoryKv::new();
        kv.write_batch(vec![BatchOp::put(b"k".to_vec(), b"v".to_vec())])
            .unwrap();
        assert_eq!(kv.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn batch_is_all_or_nothing_in_effect() {
        let kv = MemoryKv::new();
        kv.write_batch(vec![
            BatchOp::put(b"a".to_vec(), b"1".to_vec()),
            BatchOp::put(b"b".to_vec(), b"2".to_vec()),
        ])
        .unwrap();
        assert_eq!(kv.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(kv.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn prefix_scan_orders_ascending_and_descending() {
        let kv = MemoryKv::new();
        kv.write_batch(vec![
            BatchOp::put(b"p:1".to_vec(), b"a".to_vec()),
            BatchOp::put(b"p:2".to_vec(), b"b".to_vec()),
            BatchOp::put(b"q:1".to_vec(), b"c".to_vec()),
        ])
        .unwrap();
        let asc = kv.prefix_scan(b"p:", false).unwrap();
        assert_eq!(asc, vec![(b"p:1".to_vec(), b"a".to_vec()), (b"p:2".to_vec(), b"b".to_vec())]);
        let desc = kv.prefix_scan(b"p:", true).unwrap();
        assert_eq!(desc, vec![(b"p:2".to_vec(), b"b".to_vec()), (b"p:1".to_vec(), b"a".to_vec())]);
    }

    #[test]
    fn delete_removes_key() {
        let kv = MemoryKv::new();
        kv.write_batch(vec![BatchOp::put(b"k".to_vec(), b"v".to_vec())])
            .unwrap();
        kv.write_batch(vec![BatchOp::delete(b"k".to_vec())]).unwrap();
        assert_eq!(kv.get(b"k").unwrap(), None);
    }
}
