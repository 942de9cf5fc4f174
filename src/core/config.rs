/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Documents fetched per store scan round during cursor search.
    pub batch_size: usize,
    /// Result page size when the caller does not pass a limit.
    pub default_limit: usize,
    /// Number of per-term mutation lock shards. Must be non-zero.
    pub lock_shards: usize,
    pub fuzzy: FuzzyConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            batch_size: 256,
            default_limit: 10,
            lock_shards: 64,
            fuzzy: FuzzyConfig::default(),
        }
    }
}

/// Fuzzy-matching policy. The threshold and gram sizes are empirically
/// chosen defaults, exposed as tunables rather than constants.
#[derive(Debug, Clone)]
pub struct FuzzyConfig {
    /// Minimum normalized Levenshtein similarity for a vocabulary term to
    /// count as a match for a query term.
    pub similarity_threshold: f64,
    /// Gram lengths combined into each term's fingerprint set.
    pub gram_sizes: Vec<usize>,
    /// Fixed minimum shared-gram count for candidate generation.
    /// None selects the length-adaptive floor (short targets need fewer
    /// shared grams to avoid false negatives).
    pub min_matches: Option<usize>,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        FuzzyConfig {
            similarity_threshold: 0.6,
            gram_sizes: vec![2, 3],
            min_matches: None,
        }
    }
}
