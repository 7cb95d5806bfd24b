//! Frequency-ranked keyword extraction with 2- and 3-word phrases.

use crate::normalize::TextNormalizer;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Tokens of this length or shorter are never keywords.
const MIN_TOKEN_LEN_EXCLUSIVE: usize = 3;

/// Common stop words, plus deck boilerplate ("slide", "presentation").
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do",
        "does", "did", "will", "would", "should", "could", "may", "might", "must", "can", "this",
        "that", "these", "those", "i", "you", "he", "she", "it", "we", "they", "what", "which",
        "who", "when", "where", "why", "how", "all", "each", "every", "both", "few", "more",
        "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
        "too", "very", "just", "slide", "presentation",
    ]
    .into_iter()
    .collect()
});

/// An important term found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    /// Lowercased word or space-joined 2-3 word phrase.
    pub term: String,
    /// Occurrences in the analyzed text.
    pub frequency: u32,
}

impl Keyword {
    pub fn new(term: impl Into<String>, frequency: u32) -> Self {
        Self {
            term: term.into(),
            frequency,
        }
    }
}

/// Returns true if the token survives stop-word and length filtering.
pub fn is_candidate_token(token: &str) -> bool {
    token.chars().count() > MIN_TOKEN_LEN_EXCLUSIVE && !STOP_WORDS.contains(token)
}

/// Keyword extractor.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    normalizer: TextNormalizer,
}

impl KeywordExtractor {
    /// Create an extractor using the default normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific normalizer for cleaning.
    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Clean `text` and extract up to `top_n` keywords.
    pub fn extract(&self, text: &str, top_n: usize) -> Vec<Keyword> {
        let tokens = self.normalizer.tokenize(text);
        self.rank_tokens(&tokens, top_n)
    }

    /// Rank already-cleaned tokens.
    ///
    /// Single words are ranked unconditionally; phrases only count when they
    /// occur more than once. Both lists are merged by frequency, descending,
    /// ties keeping first-seen order (words ahead of phrases).
    pub fn rank_tokens<S: AsRef<str>>(&self, tokens: &[S], top_n: usize) -> Vec<Keyword> {
        let words: Vec<&str> = tokens
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| is_candidate_token(t))
            .collect();

        if words.is_empty() || top_n == 0 {
            return Vec::new();
        }

        let mut word_counts: IndexMap<&str, u32> = IndexMap::new();
        for &word in &words {
            *word_counts.entry(word).or_insert(0) += 1;
        }

        // Bigrams first, then trigrams, so first-seen order matches phrase length.
        let mut phrase_counts: IndexMap<String, u32> = IndexMap::new();
        for n in [2, 3] {
            for window in words.windows(n) {
                *phrase_counts.entry(window.join(" ")).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<Keyword> = most_common(word_counts, top_n)
            .into_iter()
            .map(|(term, count)| Keyword::new(term, count))
            .collect();

        terms.extend(
            most_common(phrase_counts, top_n / 2)
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .map(|(term, count)| Keyword::new(term, count)),
        );

        terms.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        terms.truncate(top_n);

        log::debug!("Ranked {} keywords from {} tokens", terms.len(), tokens.len());
        terms
    }
}

/// The `n` highest counts, descending, first-seen order on ties.
fn most_common<K>(counts: IndexMap<K, u32>, n: usize) -> Vec<(K, u32)> {
    let mut entries: Vec<(K, u32)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(n);
    entries
}
