//! Full content analysis: keywords, topics, entities and technology terms.

use crate::entities::{Entity, EntityRecognizer};
use crate::keywords::{Keyword, KeywordExtractor};
use crate::normalize::TextNormalizer;
use crate::topics::{Topic, TopicSynthesizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Technology vocabulary matched as substrings of cleaned text.
const TECH_TERMS: &[&str] = &[
    "api", "cloud", "kubernetes", "docker", "aws", "azure", "gcp", "microservices",
    "serverless", "database", "sql", "nosql", "machine learning", "ml", "ai",
    "artificial intelligence", "devops", "cicd", "ci/cd", "automation", "infrastructure",
    "security", "authentication", "authorization", "encryption", "performance",
    "scalability", "monitoring", "observability",
];

/// Analysis tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Keywords to extract.
    pub keyword_count: usize,
    /// Topics derived from those keywords.
    pub topic_count: usize,
    /// Minimum occurrences before a capitalized run counts as an entity.
    pub entity_min_frequency: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            keyword_count: 30,
            topic_count: 10,
            entity_min_frequency: 2,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyword_count(mut self, count: usize) -> Self {
        self.keyword_count = count;
        self
    }

    pub fn with_topic_count(mut self, count: usize) -> Self {
        self.topic_count = count;
        self
    }

    pub fn with_entity_min_frequency(mut self, min: u32) -> Self {
        self.entity_min_frequency = min.max(1);
        self
    }
}

/// Result of analyzing one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub keywords: Vec<Keyword>,
    pub topics: Vec<Topic>,
    pub entities: Vec<Entity>,
    /// Sorted technology terms present in the text.
    pub tech_terms: Vec<String>,
}

/// Runs every extractor over a text.
#[derive(Debug, Clone, Default)]
pub struct ContentAnalyzer {
    config: AnalysisConfig,
    normalizer: TextNormalizer,
    keywords: KeywordExtractor,
    topics: TopicSynthesizer,
    entities: EntityRecognizer,
}

impl ContentAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Analyze `text`. Keyword work runs on the cleaned form, entity
    /// detection on the case-preserved original.
    pub fn analyze(&self, text: &str) -> ContentAnalysis {
        let tokens = self.normalizer.tokenize(text);
        let keywords = self.keywords.rank_tokens(&tokens, self.config.keyword_count);
        let topics = self.topics.synthesize(&keywords, self.config.topic_count);
        let entities = self
            .entities
            .recognize(text, self.config.entity_min_frequency);
        let tech_terms = self.extract_tech_terms(text);

        ContentAnalysis {
            keywords,
            topics,
            entities,
            tech_terms,
        }
    }

    /// Technology vocabulary found anywhere in the cleaned text.
    pub fn extract_tech_terms(&self, text: &str) -> Vec<String> {
        let cleaned = self.normalizer.clean_text(text);
        if cleaned.is_empty() {
            return Vec::new();
        }

        TECH_TERMS
            .iter()
            .filter(|term| cleaned.contains(*term))
            .map(|term| term.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
