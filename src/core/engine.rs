use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::analysis::tokenizer::{MixedTokenizer, Tokenizer};
use crate::core::config::EngineConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document, FieldValue};
use crate::index::inverted::InvertedIndex;
use crate::query::parser::QueryParser;
use crate::search::searcher::{Searcher, SearchOptions, SearchResults};
use crate::search::sorter::{Sorter, SortSpec};
use crate::storage::documents::{now_millis, DocIdGenerator, DocumentStore};
use crate::storage::memory::MemoryStore;
use crate::storage::store::KvStore;

/// The embeddable engine: one backing store, one tokenizer strategy shared
/// by the index and the query parser, and the components wired over them.
///
/// Write path: tokenizer → inverted-index mutation. Read path: query parser
/// → candidate term set (direct or fuzzy-expanded) → cursor scan over the
/// document stream.
pub struct SearchEngine {
    config: EngineConfig,
    index: InvertedIndex,
    documents: DocumentStore,
    parser: QueryParser,
    ids: DocIdGenerator,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn KvStore>, tokenizer: Box<dyn Tokenizer>, config: EngineConfig) -> Self {
        let index = InvertedIndex::new(store.clone(), tokenizer.clone_box(), config.lock_shards);
        let documents = DocumentStore::new(store);
        let parser = QueryParser::new(tokenizer);
        SearchEngine {
            config,
            index,
            documents,
            parser,
            ids: DocIdGenerator::new(),
        }
    }

    /// Engine over the in-memory store with the mixed CJK/Latin tokenizer.
    pub fn in_memory() -> Self {
        SearchEngine::new(
            Arc::new(MemoryStore::new()),
            Box::new(MixedTokenizer::new()),
            EngineConfig::default(),
        )
    }

    /// Stores and indexes a new document. Assigns the id and timestamps,
    /// caches the de-duplicated term list on the record.
    pub fn insert(&self, fields: HashMap<String, FieldValue>) -> Result<Document> {
        let mut doc = Document::new(self.ids.next());
        let now = now_millis();
        doc.created_at = now;
        doc.updated_at = now;
        doc.fields = fields;
        doc.terms = self.index.index_document(doc.id, &indexable_text(&doc))?;
        self.documents.put(&doc)?;
        Ok(doc)
    }

    /// Replaces a document's fields. The index footprint is fully replaced:
    /// old postings are removed before the new ones are added, never
    /// merged, so stale terms cannot survive a content change.
    pub fn update(&self, id: DocId, fields: HashMap<String, FieldValue>) -> Result<Document> {
        let old = self.documents.get(id)?.ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("document {} not found", id.0))
        })?;

        self.index.remove_document(id, &old.terms)?;

        let mut doc = Document::new(id);
        doc.created_at = old.created_at;
        doc.updated_at = now_millis();
        doc.fields = fields;
        doc.terms = self.index.index_document(id, &indexable_text(&doc))?;
        self.documents.put(&doc)?;
        Ok(doc)
    }

    /// Deletes the document and its whole index footprint. Returns false
    /// when the id was not present.
    pub fn delete(&self, id: DocId) -> Result<bool> {
        match self.documents.delete(id)? {
            Some(doc) => {
                self.index.remove_document(id, &doc.terms)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn get(&self, id: DocId) -> Result<Option<Document>> {
        self.documents.get(id)
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResults> {
        Searcher::new(&self.index, &self.documents, &self.parser, &self.config)
            .search(query, options)
    }

    /// Legacy non-cursor ordering over an id list.
    pub fn sort(&self, doc_ids: &[DocId], specs: &[SortSpec]) -> Result<Vec<DocId>> {
        Sorter::new(&self.documents).sort(doc_ids, specs)
    }

    // Lower-level index primitives, for callers composing their own query
    // logic or driving index maintenance directly.

    pub fn index_document(&self, id: DocId, text: &str) -> Result<Vec<String>> {
        self.index.index_document(id, text)
    }

    /// Removes a document's postings, resolving its term set from the
    /// record's cached terms. The cache is cleared afterwards so the record
    /// never claims vocabulary it no longer has.
    pub fn remove_document_index(&self, id: DocId) -> Result<()> {
        let Some(mut doc) = self.documents.get(id)? else {
            return Ok(());
        };
        self.index.remove_document(id, &doc.terms)?;
        if !doc.terms.is_empty() {
            doc.terms.clear();
            self.documents.put(&doc)?;
        }
        Ok(())
    }

    pub fn find_documents_by_term(&self, term: &str) -> Result<HashSet<DocId>> {
        self.index.find_documents_by_term(term)
    }

    pub fn find_documents_by_terms_and(&self, terms: &[String]) -> Result<HashSet<DocId>> {
        self.index.find_documents_by_terms_and(terms)
    }

    pub fn find_documents_by_terms_or(&self, terms: &[String]) -> Result<HashSet<DocId>> {
        self.index.find_documents_by_terms_or(terms)
    }

    pub fn all_terms(&self) -> Result<Vec<String>> {
        self.index.all_terms()
    }
}

/// The text a document is indexed under: all text fields, concatenated in
/// field-name order so reindexing is deterministic.
fn indexable_text(doc: &Document) -> String {
    let mut fields: Vec<(&str, &str)> = doc.text_fields().collect();
    fields.sort_by_key(|(name, _)| *name);
    fields
        .iter()
        .map(|(_, text)| *text)
        .collect::<Vec<_>>()
        .join(" ")
}
