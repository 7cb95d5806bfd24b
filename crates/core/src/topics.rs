//! Topics derived 1:1 from ranked keywords.

use crate::keywords::Keyword;
use crate::normalize::title_case;
use serde::{Deserialize, Serialize};

/// A topic candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Title-cased keyword term.
    pub name: String,
    /// Frequency relative to the most frequent keyword, in `[0, 1]`.
    pub relevance_score: f64,
    /// Source keyword terms.
    pub keywords: Vec<String>,
}

/// Turns ranked keywords into topics.
///
/// There is no clustering here; grouping happens later through the
/// topic co-occurrence graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopicSynthesizer;

impl TopicSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Derive up to `top_n` topics, scored against the maximum frequency
    /// across *all* given keywords.
    pub fn synthesize(&self, keywords: &[Keyword], top_n: usize) -> Vec<Topic> {
        let max_frequency = keywords.iter().map(|k| k.frequency).max().unwrap_or(0);

        keywords
            .iter()
            .take(top_n)
            .map(|keyword| Topic {
                name: title_case(&keyword.term),
                relevance_score: if max_frequency == 0 {
                    0.0
                } else {
                    f64::from(keyword.frequency) / f64::from(max_frequency)
                },
                keywords: vec![keyword.term.clone()],
            })
            .collect()
    }
}
