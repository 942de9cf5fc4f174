use std::collections::HashSet;

use crate::core::cancel::CancelToken;
use crate::core::config::EngineConfig;
use crate::core::types::Document;
use crate::index::inverted::InvertedIndex;
use crate::query::parser::QueryParser;
use crate::search::fuzzy::{find_similar_terms, NGramIndex};
use crate::storage::documents::{DocumentStore, SortBy, SortOrder};

use crate::core::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

/// Knobs of one search call. `last_key` is the `next_key` of the previous
/// page, opaque to the caller.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub sort_by: SortBy,
    pub order: SortOrder,
    pub operator: Operator,
    pub limit: Option<usize>,
    pub last_key: Option<Vec<u8>>,
    pub fuzzy: bool,
    pub exact: bool,
    pub highlight: bool,
    pub cancel: Option<CancelToken>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            sort_by: SortBy::DocId,
            order: SortOrder::Asc,
            operator: Operator::And,
            limit: None,
            last_key: None,
            fuzzy: false,
            exact: false,
            highlight: false,
            cancel: None,
        }
    }
}

/// Literal occurrence of the query string in one field, for display.
/// Offsets are byte positions in the stored field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub field: String,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: Document,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub items: Vec<SearchHit>,
    /// Store key of the last matching document of this page. Unset when
    /// the scanned range was exhausted, i.e. pagination is complete.
    pub next_key: Option<Vec<u8>>,
}

impl SearchResults {
    fn empty() -> Self {
        SearchResults {
            items: Vec::new(),
            next_key: None,
        }
    }
}

/// How one visited document is judged against the query.
enum MatchPredicate {
    /// Case-insensitive substring containment in any text field. Requires
    /// the full field values, not the cached term list.
    Phrase(String),
    /// One allowed-term set per query term, tested against the document's
    /// cached terms. Exact boolean queries use singleton sets; fuzzy
    /// queries use the similarity-expanded sets.
    TermSets {
        sets: Vec<HashSet<String>>,
        operator: Operator,
    },
}

impl MatchPredicate {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            MatchPredicate::Phrase(phrase) => doc
                .text_fields()
                .any(|(_, text)| !find_case_insensitive(text, phrase).is_empty()),
            MatchPredicate::TermSets { sets, operator } => {
                let hit = |set: &HashSet<String>| doc.terms.iter().any(|t| set.contains(t));
                match operator {
                    Operator::And => sets.iter().all(hit),
                    Operator::Or => sets.iter().any(hit),
                }
            }
        }
    }
}

/// Evaluates one query: parse, resolve the match predicate, then ranged
/// predicate-filtered cursor retrieval over the document stream.
pub struct Searcher<'a> {
    index: &'a InvertedIndex,
    documents: &'a DocumentStore,
    parser: &'a QueryParser,
    config: &'a EngineConfig,
}

impl<'a> Searcher<'a> {
    pub fn new(
        index: &'a InvertedIndex,
        documents: &'a DocumentStore,
        parser: &'a QueryParser,
        config: &'a EngineConfig,
    ) -> Self {
        Searcher {
            index,
            documents,
            parser,
            config,
        }
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResults> {
        let parsed = self.parser.parse(query, options.exact);
        if parsed.is_empty() {
            return Ok(SearchResults::empty());
        }

        let predicate = self.build_predicate(&parsed.terms, parsed.is_phrase, options)?;
        let needle = options.highlight.then(|| query.trim().to_lowercase());

        let limit = options.limit.unwrap_or(self.config.default_limit);
        if limit == 0 {
            return Ok(SearchResults::empty());
        }
        let mut items = Vec::new();
        let mut after = options.last_key.clone();

        loop {
            if let Some(cancel) = &options.cancel {
                cancel.check("search scan")?;
            }

            let page = self.documents.scan_page(
                options.sort_by,
                options.order,
                after.as_deref(),
                self.config.batch_size,
            )?;
            if page.is_empty() {
                // Range exhausted: pagination is complete, no cursor.
                return Ok(SearchResults {
                    items,
                    next_key: None,
                });
            }

            for (key, doc) in page {
                if predicate.matches(&doc) {
                    let highlights = needle
                        .as_deref()
                        .map(|n| highlight_document(&doc, n))
                        .unwrap_or_default();
                    items.push(SearchHit {
                        document: doc,
                        highlights,
                    });
                    if items.len() >= limit {
                        // The cursor is the key of the last MATCHING
                        // document, not the last visited one.
                        return Ok(SearchResults {
                            items,
                            next_key: Some(key),
                        });
                    }
                }
                after = Some(key);
            }
        }
    }

    fn build_predicate(
        &self,
        terms: &[String],
        is_phrase: bool,
        options: &SearchOptions,
    ) -> Result<MatchPredicate> {
        if is_phrase {
            return Ok(MatchPredicate::Phrase(terms[0].clone()));
        }

        if options.fuzzy {
            let sets = self.expand_fuzzy_terms(terms, options.cancel.as_ref())?;
            return Ok(MatchPredicate::TermSets {
                sets,
                operator: options.operator,
            });
        }

        // Single-character tokens are noise from the CJK unigram overlay;
        // drop them whenever the query also carries a full word. A query of
        // only single characters keeps them.
        let full_words: Vec<&String> = terms
            .iter()
            .filter(|t| t.chars().count() >= 2)
            .collect();
        let effective: Vec<&String> = if full_words.is_empty() {
            terms.iter().collect()
        } else {
            full_words
        };

        Ok(MatchPredicate::TermSets {
            sets: effective
                .into_iter()
                .map(|t| HashSet::from([t.clone()]))
                .collect(),
            operator: options.operator,
        })
    }

    /// Similar-term set per query term: n-gram candidates from the full
    /// vocabulary, filtered by normalized edit-distance similarity, always
    /// unioned with the original term.
    fn expand_fuzzy_terms(
        &self,
        terms: &[String],
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<HashSet<String>>> {
        let fuzzy = &self.config.fuzzy;
        let vocabulary = self.index.all_terms()?;
        let grams = NGramIndex::build(vocabulary, fuzzy);

        let mut sets = Vec::with_capacity(terms.len());
        for term in terms {
            if let Some(cancel) = cancel {
                cancel.check("fuzzy expansion")?;
            }
            let candidates = grams.candidates(term, fuzzy.min_matches);
            let mut set: HashSet<String> =
                find_similar_terms(term, candidates, fuzzy.similarity_threshold)
                    .into_iter()
                    .collect();
            set.insert(term.clone());
            tracing::debug!(term = term.as_str(), expanded = set.len(), "fuzzy term set");
            sets.push(set);
        }
        Ok(sets)
    }
}

/// Byte spans of non-overlapping, case-insensitive occurrences of
/// `needle_lower` (already lower-cased) in `haystack`.
fn find_case_insensitive(haystack: &str, needle_lower: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    if needle_lower.is_empty() {
        return spans;
    }
    let needle: Vec<char> = needle_lower.chars().collect();
    let hay: Vec<(usize, char)> = haystack.char_indices().collect();

    let mut i = 0;
    while i + needle.len() <= hay.len() {
        let matched = needle.iter().enumerate().all(|(j, nc)| {
            let hc = hay[i + j].1;
            hc.to_lowercase().next().unwrap_or(hc) == *nc
        });
        if matched {
            let start = hay[i].0;
            let end = hay
                .get(i + needle.len())
                .map(|(offset, _)| *offset)
                .unwrap_or(haystack.len());
            spans.push((start, end - start));
            i += needle.len();
        } else {
            i += 1;
        }
    }
    spans
}

/// Literal query occurrences per text field, informational only.
fn highlight_document(doc: &Document, needle_lower: &str) -> Vec<Highlight> {
    let mut highlights = Vec::new();
    for (field, text) in doc.text_fields() {
        for (offset, length) in find_case_insensitive(text, needle_lower) {
            highlights.push(Highlight {
                field: field.to_string(),
                offset,
                length,
            });
        }
    }
    highlights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tokenizer::MixedTokenizer;
    use crate::core::error::ErrorKind;
    use crate::core::types::{DocId, FieldValue};
    use crate::storage::memory::MemoryStore;
    use std::sync::Arc;

    struct Fixture {
        index: InvertedIndex,
        documents: DocumentStore,
        parser: QueryParser,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            Fixture {
                index: InvertedIndex::new(store.clone(), Box::new(MixedTokenizer::new()), 16),
                documents: DocumentStore::new(store),
                parser: QueryParser::new(Box::new(MixedTokenizer::new())),
                config: EngineConfig {
                    batch_size: 2,
                    ..EngineConfig::default()
                },
            }
        }

        fn add(&self, id: u64, title: &str) {
            let mut doc = Document::new(DocId(id));
            doc.created_at = id;
            doc.updated_at = id;
            doc.add_field("title", FieldValue::Text(title.to_string()));
            doc.terms = self.index.index_document(doc.id, title).unwrap();
            self.documents.put(&doc).unwrap();
        }

        fn searcher(&self) -> Searcher<'_> {
            Searcher::new(&self.index, &self.documents, &self.parser, &self.config)
        }

        fn ids(&self, query: &str, options: &SearchOptions) -> Vec<u64> {
            self.searcher()
                .search(query, options)
                .unwrap()
                .items
                .iter()
                .map(|hit| hit.document.id.0)
                .collect()
        }
    }

    #[test]
    fn and_requires_all_terms_or_any() {
        let f = Fixture::new();
        f.add(1, "rust search engine");
        f.add(2, "rust storage engine");
        f.add(3, "python search library");

        let and = SearchOptions::default();
        assert_eq!(f.ids("rust search", &and), vec![1]);

        let or = SearchOptions {
            operator: Operator::Or,
            ..SearchOptions::default()
        };
        assert_eq!(f.ids("rust search", &or), vec![1, 2, 3]);
    }

    #[test]
    fn empty_query_yields_empty_results() {
        let f = Fixture::new();
        f.add(1, "anything");
        let results = f.searcher().search("  ", &SearchOptions::default()).unwrap();
        assert!(results.items.is_empty());
        assert!(results.next_key.is_none());
    }

    #[test]
    fn single_character_terms_are_dropped_next_to_full_words() {
        let f = Fixture::new();
        f.add(1, "机器 learning");
        f.add(2, "learning");

        // "机 learning": the unigram would wrongly exclude doc 2 under AND.
        assert_eq!(f.ids("机 learning", &SearchOptions::default()), vec![1, 2]);
        // All-single-character query falls back to using them.
        assert_eq!(f.ids("机", &SearchOptions::default()), vec![1]);
    }

    #[test]
    fn phrase_matches_by_substring_containment() {
        let f = Fixture::new();
        f.add(1, "Stable Cursor Pagination");
        f.add(2, "cursor stable pagination");

        let exact = SearchOptions {
            exact: true,
            ..SearchOptions::default()
        };
        assert_eq!(f.ids("stable cursor", &exact), vec![1]);
    }

    #[test]
    fn fuzzy_finds_misspelled_terms() {
        let f = Fixture::new();
        f.add(1, "javascript tutorial");
        f.add(2, "rust tutorial");

        let fuzzy = SearchOptions {
            fuzzy: true,
            ..SearchOptions::default()
        };
        assert_eq!(f.ids("javascrpt", &fuzzy), vec![1]);
        // Same set as the correct spelling.
        assert_eq!(f.ids("javascript", &fuzzy), vec![1]);
    }

    #[test]
    fn descending_order_reverses_the_stream() {
        let f = Fixture::new();
        for id in 1..=3 {
            f.add(id, "engine");
        }
        let desc = SearchOptions {
            order: SortOrder::Desc,
            ..SearchOptions::default()
        };
        assert_eq!(f.ids("engine", &desc), vec![3, 2, 1]);
    }

    #[test]
    fn chained_pages_equal_one_unbounded_scan() {
        let f = Fixture::new();
        // Matching and non-matching documents interleaved, so cursors land
        // on filtered-out records too.
        for id in 1..=10u64 {
            if id % 3 == 0 {
                f.add(id, "filler noise");
            } else {
                f.add(id, "cursor target");
            }
        }

        let unbounded = SearchOptions {
            limit: Some(100),
            ..SearchOptions::default()
        };
        let all = f.ids("cursor", &unbounded);

        let mut paged = Vec::new();
        let mut last_key = None;
        loop {
            let options = SearchOptions {
                limit: Some(2),
                last_key: last_key.clone(),
                ..SearchOptions::default()
            };
            let page = f.searcher().search("cursor", &options).unwrap();
            paged.extend(page.items.iter().map(|hit| hit.document.id.0));
            match page.next_key {
                Some(key) => last_key = Some(key),
                None => break,
            }
        }

        assert_eq!(paged, all);
    }

    #[test]
    fn highlight_reports_field_offsets() {
        let f = Fixture::new();
        f.add(1, "Rust and more rust");

        let options = SearchOptions {
            highlight: true,
            ..SearchOptions::default()
        };
        let results = f.searcher().search("rust", &options).unwrap();
        assert_eq!(
            results.items[0].highlights,
            vec![
                Highlight { field: "title".into(), offset: 0, length: 4 },
                Highlight { field: "title".into(), offset: 14, length: 4 },
            ]
        );
    }

    #[test]
    fn cancelled_search_returns_cancelled_error() {
        let f = Fixture::new();
        f.add(1, "anything");
        let cancel = CancelToken::new();
        cancel.cancel();

        let options = SearchOptions {
            cancel: Some(cancel),
            ..SearchOptions::default()
        };
        let err = f.searcher().search("anything", &options).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
    }
}
