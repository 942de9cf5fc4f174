use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::core::error::Result;
use crate::storage::store::{Direction, KvStore, ScanRange};

/// Ordered in-memory store over a BTreeMap. The default backing store for
/// embedded use and tests; anything persistent plugs in behind the same
/// [`KvStore`] trait.
#[derive(Default)]
pub struct MemoryStore {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.map.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.map.write().remove(key);
        Ok(())
    }

    fn scan(
        &self,
        range: ScanRange,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self.map.read();
        let iter = map
            .range((range.lower, range.upper))
            .map(|(k, v)| (k.clone(), v.clone()));

        let take = if limit == 0 { usize::MAX } else { limit };
        let batch = match direction {
            Direction::Forward => iter.take(take).collect(),
            Direction::Reverse => iter.rev().take(take).collect(),
        };
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for key in [b"a/1", b"a/2", b"a/3", b"b/1"] {
            store.put(key, key).unwrap();
        }
        store
    }

    #[test]
    fn get_put_delete_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(b"k").unwrap(), None);
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn prefix_scan_respects_table_boundary() {
        let store = seeded();
        let batch = store
            .scan(ScanRange::prefix(b"a/"), Direction::Forward, 0)
            .unwrap();
        let keys: Vec<&[u8]> = batch.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![b"a/1", b"a/2", b"a/3"]);
    }

    #[test]
    fn exclusive_lower_bound_resumes_after_key() {
        let store = seeded();
        let batch = store
            .scan(ScanRange::prefix(b"a/").after(b"a/1"), Direction::Forward, 1)
            .unwrap();
        assert_eq!(batch[0].0, b"a/2".to_vec());
    }

    #[test]
    fn reverse_scan_with_exclusive_upper_bound() {
        let store = seeded();
        let batch = store
            .scan(ScanRange::prefix(b"a/").before(b"a/3"), Direction::Reverse, 0)
            .unwrap();
        let keys: Vec<&[u8]> = batch.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![b"a/2", b"a/1"]);
    }
}
