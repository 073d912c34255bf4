//! Fuzzy facet search
//!
//! Each facet gets its own [`FacetIndex`] over its vocabulary. Matching is
//! case-insensitive and approximate: exact, prefix and substring hits rank
//! highest, then edit-distance similarity against the whole tag and against
//! each word of the tag. Candidates below [`MATCH_THRESHOLD`] are dropped.

use std::cmp::Ordering;

/// Minimum similarity (0.0..=1.0) for a tag to be returned
pub const MATCH_THRESHOLD: f64 = 0.65;

/// Weight applied to whole-string Jaro-Winkler, which is generous on short strings
const JARO_WINKLER_WEIGHT: f64 = 0.8;

/// Shortest query compared against word prefixes
const MIN_PARTIAL_LEN: usize = 3;

/// A ranked search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub tag: String,
    pub score: f64,
}

/// Search index over one facet's vocabulary
#[derive(Debug, Clone, Default)]
pub struct FacetIndex {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    tag: String,
    normalized: String,
}

impl FacetIndex {
    pub fn new(tags: &[String]) -> Self {
        let entries = tags
            .iter()
            .map(|tag| Entry {
                tag: tag.clone(),
                normalized: tag.to_lowercase(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranked matches for `query`, best first
    ///
    /// A blank query matches every tag in vocabulary order. Equal scores keep
    /// vocabulary order.
    pub fn search(&self, query: &str) -> Vec<SearchMatch> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self
                .entries
                .iter()
                .map(|e| SearchMatch {
                    tag: e.tag.clone(),
                    score: 1.0,
                })
                .collect();
        }

        let mut matches: Vec<SearchMatch> = self
            .entries
            .iter()
            .filter_map(|e| {
                let score = similarity(&query, &e.normalized);
                (score >= MATCH_THRESHOLD).then(|| SearchMatch {
                    tag: e.tag.clone(),
                    score,
                })
            })
            .collect();

        // sort_by is stable, ties keep vocabulary order
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        matches
    }

    /// Matching tag names only, best first
    pub fn filter(&self, query: &str) -> Vec<String> {
        self.search(query).into_iter().map(|m| m.tag).collect()
    }
}

/// Similarity of a lowercase query to a lowercase candidate, 0.0..=1.0
pub fn similarity(query: &str, candidate: &str) -> f64 {
    if candidate == query {
        return 1.0;
    }

    let coverage = query.chars().count() as f64 / candidate.chars().count().max(1) as f64;
    if candidate.starts_with(query) {
        return 0.9 + 0.1 * coverage;
    }
    if candidate.contains(query) {
        return 0.8 + 0.1 * coverage;
    }

    let whole = strsim::normalized_levenshtein(query, candidate)
        .max(strsim::jaro_winkler(query, candidate) * JARO_WINKLER_WEIGHT);

    candidate
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word_similarity(query, word))
        .fold(whole, f64::max)
}

fn word_similarity(query: &str, word: &str) -> f64 {
    let full = strsim::normalized_levenshtein(query, word);

    let query_len = query.chars().count();
    if query_len < MIN_PARTIAL_LEN || word.chars().count() <= query_len {
        return full;
    }

    // Typo in a partially typed word: compare against the word's prefix
    let prefix: String = word.chars().take(query_len).collect();
    full.max(0.9 * strsim::normalized_levenshtein(query, &prefix))
}
