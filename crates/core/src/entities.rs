//! Capitalization-based entity detection and rule-based classification.
//!
//! This is a heuristic: it will mislabel some names, and that is accepted.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Runs of capitalized words separated by whitespace.
static CAPITALIZED_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").unwrap());

/// Entity names of this length or shorter are dropped.
const MIN_NAME_LEN_EXCLUSIVE: usize = 3;

const TECH_INDICATORS: &[&str] = &["api", "server", "cloud", "app", "platform", "service"];

const ORG_INDICATORS: &[&str] = &["inc", "corp", "ltd", "llc", "company"];

/// Coarse entity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Tech,
    Org,
    Product,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tech => "TECH",
            Self::Org => "ORG",
            Self::Product => "PRODUCT",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    /// Occurrences in the analyzed text.
    pub frequency: u32,
}

/// One classification rule. Receives the lowercased name.
#[derive(Clone, Copy)]
pub struct ClassificationRule {
    pub kind: EntityKind,
    pub matches: fn(&str) -> bool,
}

impl fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn contains_tech_indicator(name: &str) -> bool {
    TECH_INDICATORS.iter().any(|i| name.contains(i))
}

fn contains_org_indicator(name: &str) -> bool {
    ORG_INDICATORS.iter().any(|i| name.contains(i))
}

fn is_single_word(name: &str) -> bool {
    name.split_whitespace().count() == 1
}

fn is_multi_word(name: &str) -> bool {
    name.split_whitespace().count() > 1
}

/// Rules are evaluated in order; the first match wins.
pub const DEFAULT_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        kind: EntityKind::Tech,
        matches: contains_tech_indicator,
    },
    ClassificationRule {
        kind: EntityKind::Org,
        matches: contains_org_indicator,
    },
    ClassificationRule {
        kind: EntityKind::Product,
        matches: is_single_word,
    },
    ClassificationRule {
        kind: EntityKind::Org,
        matches: is_multi_word,
    },
];

/// Entity recognizer.
#[derive(Debug, Clone)]
pub struct EntityRecognizer {
    rules: &'static [ClassificationRule],
}

impl Default for EntityRecognizer {
    fn default() -> Self {
        Self { rules: DEFAULT_RULES }
    }
}

impl EntityRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the classification rule list.
    pub fn with_rules(mut self, rules: &'static [ClassificationRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Classify a name. Falls back to `Org` when no rule matches.
    pub fn classify(&self, name: &str) -> EntityKind {
        let lowered = name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| (rule.matches)(&lowered))
            .map(|rule| rule.kind)
            .unwrap_or(EntityKind::Org)
    }

    /// Find entities in case-preserved text.
    ///
    /// Keeps names seen at least `min_frequency` times and longer than three
    /// characters, in first-seen order.
    pub fn recognize(&self, text: &str, min_frequency: u32) -> Vec<Entity> {
        let mut counts: IndexMap<&str, u32> = IndexMap::new();
        for m in CAPITALIZED_RUN_REGEX.find_iter(text) {
            *counts.entry(m.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .filter(|(name, freq)| {
                *freq >= min_frequency && name.chars().count() > MIN_NAME_LEN_EXCLUSIVE
            })
            .map(|(name, frequency)| Entity {
                name: name.to_string(),
                kind: self.classify(name),
                frequency,
            })
            .collect()
    }
}
