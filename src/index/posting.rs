use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;

/// Posting table prefix in the backing store.
pub const POSTING_PREFIX: &[u8] = b"p/";

pub fn posting_key(term: &str) -> Vec<u8> {
    let mut key = POSTING_PREFIX.to_vec();
    key.extend_from_slice(term.as_bytes());
    key
}

pub fn term_from_posting_key(key: &[u8]) -> Result<String> {
    let raw = key.strip_prefix(POSTING_PREFIX).ok_or_else(|| {
        Error::new(ErrorKind::Internal, "key outside the posting table")
    })?;
    String::from_utf8(raw.to_vec())
        .map_err(|_| Error::new(ErrorKind::Parse, "invalid UTF-8 in posting key"))
}

/// One term's posting list. Owned exclusively by the inverted index; the
/// store only ever sees the serialized array form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingEntry {
    pub term: String,
    pub doc_ids: HashSet<DocId>,
}

/// Wire form: sorted id array plus a count that must equal the array
/// length. Must round-trip exactly.
#[derive(Serialize, Deserialize)]
struct PostingRecord {
    doc_ids: Vec<u64>,
    count: u32,
}

impl PostingEntry {
    pub fn new(term: impl Into<String>) -> Self {
        PostingEntry {
            term: term.into(),
            doc_ids: HashSet::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    /// Returns false if the id was already present (no-op add).
    pub fn add(&mut self, id: DocId) -> bool {
        self.doc_ids.insert(id)
    }

    /// Returns false if the id was not present (no-op remove).
    pub fn remove(&mut self, id: DocId) -> bool {
        self.doc_ids.remove(&id)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut doc_ids: Vec<u64> = self.doc_ids.iter().map(|id| id.0).collect();
        doc_ids.sort_unstable();
        let record = PostingRecord {
            count: doc_ids.len() as u32,
            doc_ids,
        };
        bincode::serialize(&record).map_err(Error::from)
    }

    pub fn decode(term: &str, bytes: &[u8]) -> Result<PostingEntry> {
        let record: PostingRecord = bincode::deserialize(bytes)
            .map_err(|e| Error::from(e).with_context(format!("posting entry '{}'", term)))?;

        // The count is derivable; a mismatch means a corrupt record. Repair
        // from the id array and keep going.
        if record.count as usize != record.doc_ids.len() {
            tracing::warn!(
                term,
                stored = record.count,
                actual = record.doc_ids.len(),
                "posting count disagrees with id array, repairing"
            );
        }

        Ok(PostingEntry {
            term: term.to_string(),
            doc_ids: record.doc_ids.into_iter().map(DocId).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_membership_exactly() {
        let mut entry = PostingEntry::new("rust");
        for id in [7u64, 3, 99, 3] {
            entry.add(DocId(id));
        }
        assert_eq!(entry.count(), 3);

        let decoded = PostingEntry::decode("rust", &entry.encode().unwrap()).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn add_and_remove_report_no_ops() {
        let mut entry = PostingEntry::new("rust");
        assert!(entry.add(DocId(1)));
        assert!(!entry.add(DocId(1)));
        assert!(entry.remove(DocId(1)));
        assert!(!entry.remove(DocId(1)));
        assert!(entry.is_empty());
    }

    #[test]
    fn posting_key_round_trip() {
        let key = posting_key("技术");
        assert_eq!(term_from_posting_key(&key).unwrap(), "技术");
    }
}
