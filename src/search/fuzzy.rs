use std::collections::{HashMap, HashSet};

use crate::core::config::FuzzyConfig;

/// All contiguous length-`n` (in chars) substrings of `text`, left to right.
/// Inputs shorter than `n` yield a single-element vec containing the whole
/// text, so short strings still produce one candidate gram.
pub fn generate_ngrams(text: &str, n: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if n == 0 || chars.len() < n {
        return vec![text.to_string()];
    }
    (0..=chars.len() - n)
        .map(|i| chars[i..i + n].iter().collect())
        .collect()
}

/// Classic dynamic-programming edit distance over chars: insert, delete and
/// substitute all cost 1.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr_row[0] = i;

        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };

            curr_row[j] = std::cmp::min(
                std::cmp::min(
                    prev_row[j] + 1,     // deletion
                    curr_row[j - 1] + 1, // insertion
                ),
                prev_row[j - 1] + cost, // substitution
            );
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

/// Normalized similarity: `1 - distance / max(|a|, |b|)`, bounded to [0, 1].
/// Two empty strings are identical, similarity 1.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}

/// Filter `candidates` by `similarity(target, c) >= threshold`, sorted by
/// similarity descending. Ties keep input order.
pub fn find_similar_terms<'a, I>(target: &str, candidates: I, threshold: f64) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(String, f64)> = candidates
        .into_iter()
        .filter_map(|c| {
            let score = similarity(target, c);
            (score >= threshold).then(|| (c.to_string(), score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(term, _)| term).collect()
}

/// Length-adaptive minimum shared-gram count. Short targets have few grams
/// in total, so a fixed floor of 2-3 causes false negatives on them.
pub fn adaptive_min_matches(target_len: usize) -> usize {
    match target_len {
        0..=4 => 1,
        5..=7 => 2,
        _ => 3,
    }
}

/// Vocabulary terms fingerprinted by their combined n-gram sets, for cheap
/// fuzzy candidate generation ahead of the full edit-distance pass.
pub struct NGramIndex {
    grams_by_term: HashMap<String, HashSet<String>>,
    gram_sizes: Vec<usize>,
}

impl NGramIndex {
    pub fn build<I, S>(vocabulary: I, config: &FuzzyConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gram_sizes = config.gram_sizes.clone();
        let grams_by_term = vocabulary
            .into_iter()
            .map(|term| {
                let term = term.into();
                let grams = combined_grams(&term, &gram_sizes);
                (term, grams)
            })
            .collect();

        NGramIndex {
            grams_by_term,
            gram_sizes,
        }
    }

    pub fn len(&self) -> usize {
        self.grams_by_term.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grams_by_term.is_empty()
    }

    /// Terms sharing at least `min_matches` grams with `target`. When
    /// `min_matches` is None the adaptive floor keyed to the target's char
    /// length applies.
    pub fn candidates(&self, target: &str, min_matches: Option<usize>) -> Vec<&str> {
        let target_grams = combined_grams(target, &self.gram_sizes);
        let required = min_matches
            .unwrap_or_else(|| adaptive_min_matches(target.chars().count()));

        self.grams_by_term
            .iter()
            .filter_map(|(term, grams)| {
                let matched = target_grams.iter().filter(|g| grams.contains(*g)).count();
                (matched >= required).then_some(term.as_str())
            })
            .collect()
    }
}

fn combined_grams(text: &str, gram_sizes: &[usize]) -> HashSet<String> {
    gram_sizes
        .iter()
        .flat_map(|&n| generate_ngrams(text, n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ngrams_of_hello() {
        assert_eq!(generate_ngrams("hello", 2), vec!["he", "el", "ll", "lo"]);
    }

    #[test]
    fn short_input_yields_whole_text() {
        assert_eq!(generate_ngrams("hi", 3), vec!["hi"]);
        assert_eq!(generate_ngrams("", 2), vec![""]);
    }

    #[test]
    fn ngrams_are_char_based() {
        assert_eq!(generate_ngrams("技术开发", 2), vec!["技术", "术开", "开发"]);
    }

    #[test]
    fn levenshtein_classics() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "hello"), 5);
        assert_eq!(levenshtein_distance("hello", ""), 5);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn similarity_identity_and_symmetry() {
        assert_eq!(similarity("hello", "hello"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        let ab = similarity("kitten", "sitting");
        let ba = similarity("sitting", "kitten");
        assert_eq!(ab, ba);
        assert!(ab > 0.0 && ab < 1.0);
    }

    #[test]
    fn similar_terms_sorted_by_score_descending() {
        let found = find_similar_terms(
            "javascript",
            ["javascript", "javascrpt", "java", "python"],
            0.6,
        );
        assert_eq!(found, vec!["javascript", "javascrpt"]);
    }

    #[test]
    fn adaptive_floor_by_target_length() {
        assert_eq!(adaptive_min_matches(3), 1);
        assert_eq!(adaptive_min_matches(4), 1);
        assert_eq!(adaptive_min_matches(5), 2);
        assert_eq!(adaptive_min_matches(7), 2);
        assert_eq!(adaptive_min_matches(8), 3);
    }

    #[test]
    fn ngram_index_prefilters_candidates() {
        let config = FuzzyConfig::default();
        let index = NGramIndex::build(["javascript", "typescript", "rust"], &config);

        let candidates = index.candidates("javascrpt", None);
        assert!(candidates.contains(&"javascript"));
        assert!(!candidates.contains(&"rust"));
    }

    #[test]
    fn fixed_min_matches_overrides_adaptive() {
        let config = FuzzyConfig::default();
        let index = NGramIndex::build(["ab", "abc"], &config);

        // "ab" shares exactly one gram with "abc"'s set under a floor of 1.
        assert!(!index.candidates("ab", Some(100)).contains(&"abc"));
        assert!(index.candidates("ab", Some(1)).contains(&"abc"));
    }
}
