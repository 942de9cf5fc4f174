use std::collections::HashSet;

use crate::analysis::tokenizer::Tokenizer;

/// Normalized query: term list plus the phrase/non-phrase classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub terms: Vec<String>,
    /// Phrase queries are matched later by substring containment against
    /// full field values, not by token equality.
    pub is_phrase: bool,
}

impl ParsedQuery {
    pub fn empty() -> Self {
        ParsedQuery {
            terms: Vec::new(),
            is_phrase: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(|t| t.is_empty())
    }
}

/// Turns a raw query string into a [`ParsedQuery`]. Owns the same tokenizer
/// the index was built with; diverging strategies silently lose recall.
pub struct QueryParser {
    tokenizer: Box<dyn Tokenizer>,
}

impl QueryParser {
    pub fn new(tokenizer: Box<dyn Tokenizer>) -> Self {
        QueryParser { tokenizer }
    }

    /// Exact queries are not tokenized: trimmed, lower-cased, and carried
    /// whole as a single phrase term. Everything else goes through the
    /// index tokenizer, de-duplicated in first-seen order. Empty input
    /// parses to an empty query, never an error.
    pub fn parse(&self, query: &str, exact: bool) -> ParsedQuery {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return ParsedQuery::empty();
        }

        if exact {
            return ParsedQuery {
                terms: vec![trimmed.to_lowercase()],
                is_phrase: true,
            };
        }

        let mut seen = HashSet::new();
        let terms = self
            .tokenizer
            .tokenize(trimmed)
            .into_iter()
            .filter_map(|t| seen.insert(t.text.clone()).then_some(t.text))
            .collect();

        ParsedQuery {
            terms,
            is_phrase: false,
        }
    }
}
