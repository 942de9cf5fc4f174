use std::ops::Bound;

use crate::core::error::Result;

/// Scan direction over the key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Half-open/closed key range for ordered scans.
#[derive(Debug, Clone)]
pub struct ScanRange {
    pub lower: Bound<Vec<u8>>,
    pub upper: Bound<Vec<u8>>,
}

impl ScanRange {
    pub fn all() -> Self {
        ScanRange {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// All keys starting with `prefix`.
    pub fn prefix(prefix: &[u8]) -> Self {
        ScanRange {
            lower: Bound::Included(prefix.to_vec()),
            upper: match prefix_upper_bound(prefix) {
                Some(end) => Bound::Excluded(end),
                None => Bound::Unbounded,
            },
        }
    }

    /// Restrict the range to keys strictly greater than `key`.
    pub fn after(mut self, key: &[u8]) -> Self {
        self.lower = Bound::Excluded(key.to_vec());
        self
    }

    /// Restrict the range to keys strictly less than `key`.
    pub fn before(mut self, key: &[u8]) -> Self {
        self.upper = Bound::Excluded(key.to_vec());
        self
    }
}

/// Smallest key greater than every key with the given prefix, or None if
/// the prefix is all 0xff bytes.
fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.last_mut() {
        if *last < 0xff {
            *last += 1;
            return Some(end);
        }
        end.pop();
    }
    None
}

/// Ordered key-value store the engine reads and writes through. The engine
/// never sees the concrete persistence layer, only this surface.
///
/// Reads are snapshot-at-call: a scan batch reflects the store at the moment
/// of the call and is not invalidated by later writes.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Up to `limit` entries of `range` in key order (reversed for
    /// [`Direction::Reverse`]). `limit == 0` means unbounded.
    fn scan(
        &self,
        range: ScanRange,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}
