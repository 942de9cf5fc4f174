//! findex — an embeddable full-text search engine.
//!
//! Maintains an inverted index (term → document-id set) over an abstract
//! ordered key-value store and answers exact, boolean (AND/OR), phrase and
//! fuzzy queries with stable, cursor-paginated results.

pub mod analysis;
pub mod core;
pub mod index;
pub mod query;
pub mod search;
pub mod storage;

/*
┌──────────────────────────── FINDEX LAYOUT ────────────────────────────┐
│ SearchEngine (core::engine)                                           │
│   ids: DocIdGenerator            // timestamp-derived, monotonic      │
│   index: InvertedIndex           // term → doc-id set, per-term locks │
│   documents: DocumentStore       // doc / fields / secondary tables   │
│   parser: QueryParser            // same tokenizer as the index       │
│                                                                       │
│ write path: Tokenizer → InvertedIndex upserts → terms cache           │
│ read path:  QueryParser → MatchPredicate (exact | fuzzy | phrase)     │
│             → cursor scan over DocumentStore → page + next_key        │
│                                                                       │
│ everything persists through storage::KvStore (get/put/delete/scan);   │
│ MemoryStore is the bundled ordered implementation.                    │
└───────────────────────────────────────────────────────────────────────┘
*/

pub use crate::analysis::token::Token;
pub use crate::analysis::tokenizer::{MixedTokenizer, StandardTokenizer, Tokenizer};
pub use crate::core::cancel::CancelToken;
pub use crate::core::config::{EngineConfig, FuzzyConfig};
pub use crate::core::engine::SearchEngine;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocId, Document, FieldValue};
pub use crate::index::inverted::InvertedIndex;
pub use crate::index::posting::PostingEntry;
pub use crate::query::parser::{ParsedQuery, QueryParser};
pub use crate::search::searcher::{
    Highlight, Operator, SearchHit, SearchOptions, SearchResults, Searcher,
};
pub use crate::search::sorter::{Sorter, SortSpec};
pub use crate::storage::documents::{DocumentStore, SortBy, SortOrder};
pub use crate::storage::memory::MemoryStore;
pub use crate::storage::store::{Direction, KvStore, ScanRange};
