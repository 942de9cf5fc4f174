use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::analysis::tokenizer::Tokenizer;
use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::index::posting::{posting_key, term_from_posting_key, PostingEntry, POSTING_PREFIX};
use crate::storage::store::{Direction, KvStore, ScanRange};

/// Term → document-id set over the backing store.
///
/// Every posting mutation is a read-modify-write round trip, so concurrent
/// writers touching the same term would lose updates. Mutations take a lock
/// shard keyed by the term hash, which serializes exactly the conflicting
/// ones. Reads go lock-free; scans are snapshot-at-call.
pub struct InvertedIndex {
    store: Arc<dyn KvStore>,
    tokenizer: Box<dyn Tokenizer>,
    locks: Vec<Mutex<()>>,
}

impl InvertedIndex {
    pub fn new(store: Arc<dyn KvStore>, tokenizer: Box<dyn Tokenizer>, lock_shards: usize) -> Self {
        let shards = lock_shards.max(1);
        InvertedIndex {
            store,
            tokenizer,
            locks: (0..shards).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    fn lock_term(&self, term: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        term.hash(&mut hasher);
        self.locks[hasher.finish() as usize % self.locks.len()].lock()
    }

    /// Tokenizes `text` and upserts `doc_id` into every unique term's
    /// posting entry. Returns the de-duplicated term list so the caller can
    /// cache it on the document record.
    pub fn index_document(&self, doc_id: DocId, text: &str) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let terms: Vec<String> = self
            .tokenizer
            .tokenize(text)
            .into_iter()
            .filter_map(|t| seen.insert(t.text.clone()).then_some(t.text))
            .collect();

        for term in &terms {
            let _guard = self.lock_term(term);
            let mut entry = self
                .load_entry(term)?
                .unwrap_or_else(|| PostingEntry::new(term.clone()));
            if entry.add(doc_id) {
                self.write_entry(&entry)?;
            }
        }

        tracing::debug!(doc_id = doc_id.0, terms = terms.len(), "indexed document");
        Ok(terms)
    }

    /// Removes `doc_id` from each term's posting entry, deleting entries
    /// that become empty. Idempotent: absent terms and absent ids are
    /// no-ops.
    pub fn remove_document(&self, doc_id: DocId, terms: &[String]) -> Result<()> {
        for term in terms {
            let _guard = self.lock_term(term);
            let Some(mut entry) = self.load_entry(term)? else {
                continue;
            };
            if entry.remove(doc_id) {
                self.write_entry(&entry)?;
            }
        }
        Ok(())
    }

    /// Posting set for one term; the empty set when the term is absent.
    pub fn find_documents_by_term(&self, term: &str) -> Result<HashSet<DocId>> {
        Ok(self
            .load_entry(term)?
            .map(|entry| entry.doc_ids)
            .unwrap_or_default())
    }

    /// Intersection across all terms' posting sets. Empty input matches
    /// nothing, not everything.
    pub fn find_documents_by_terms_and(&self, terms: &[String]) -> Result<HashSet<DocId>> {
        let mut iter = terms.iter();
        let Some(first) = iter.next() else {
            return Ok(HashSet::new());
        };

        let mut result = self.find_documents_by_term(first)?;
        for term in iter {
            if result.is_empty() {
                break;
            }
            let next = self.find_documents_by_term(term)?;
            result.retain(|id| next.contains(id));
        }
        Ok(result)
    }

    /// Union across all terms' posting sets.
    pub fn find_documents_by_terms_or(&self, terms: &[String]) -> Result<HashSet<DocId>> {
        let mut result = HashSet::new();
        for term in terms {
            result.extend(self.find_documents_by_term(term)?);
        }
        Ok(result)
    }

    /// Full vocabulary enumeration. Proportional to vocabulary size; used
    /// only by fuzzy candidate discovery.
    pub fn all_terms(&self) -> Result<Vec<String>> {
        let batch = self
            .store
            .scan(ScanRange::prefix(POSTING_PREFIX), Direction::Forward, 0)?;
        batch
            .iter()
            .map(|(key, _)| term_from_posting_key(key))
            .collect()
    }

    fn load_entry(&self, term: &str) -> Result<Option<PostingEntry>> {
        let key = posting_key(term);
        let Some(bytes) = self
            .store
            .get(&key)
            .map_err(|e| e.with_context(format!("get posting '{}'", term)))?
        else {
            return Ok(None);
        };

        let entry = PostingEntry::decode(term, &bytes)?;
        if entry.is_empty() {
            // An empty entry must never be stored. Delete defensively and
            // report the term as absent.
            tracing::warn!(term, "empty posting entry found, deleting");
            self.store
                .delete(&key)
                .map_err(|e| e.with_context(format!("delete posting '{}'", term)))?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn write_entry(&self, entry: &PostingEntry) -> Result<()> {
        let key = posting_key(&entry.term);
        let wrap = |e: Error| e.with_context(format!("write posting '{}'", entry.term));
        if entry.is_empty() {
            self.store.delete(&key).map_err(wrap)
        } else {
            self.store.put(&key, &entry.encode()?).map_err(wrap)
        }
    }
}
