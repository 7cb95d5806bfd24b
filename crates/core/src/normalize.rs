//! Text normalization for slide content.
//!
//! Produces the case-folded, symbol-free form that keyword analysis runs on,
//! plus the lighter slide-level cleanup that keeps case for entity detection.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// URLs, with or without a scheme.
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http\S+|www\S+").unwrap());

/// Anything that looks like an email address.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+").unwrap());

/// Everything outside word characters, whitespace and hyphens.
static SYMBOL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\-]").unwrap());

/// Regex to collapse whitespace runs (including newlines) into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Page and slide number footers left behind by PDF extraction.
static PAGE_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:page|slide)\s+\d+\b").unwrap());

/// Maximum slide title length in characters before truncation.
pub const MAX_TITLE_CHARS: usize = 150;

/// Marker appended to truncated titles.
pub const ELLIPSIS: &str = "...";

/// Text normalizer for slide text.
///
/// All methods are pure; empty input yields empty output.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Whether to apply NFKC folding before cleaning (ligatures, full-width forms).
    fold_unicode: bool,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self { fold_unicode: true }
    }
}

impl TextNormalizer {
    /// Create a new text normalizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to apply Unicode compatibility folding.
    pub fn with_fold_unicode(mut self, fold: bool) -> Self {
        self.fold_unicode = fold;
        self
    }

    fn fold<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        if self.fold_unicode {
            std::borrow::Cow::Owned(text.nfkc().collect())
        } else {
            std::borrow::Cow::Borrowed(text)
        }
    }

    /// Clean text for keyword analysis.
    ///
    /// - Lowercases
    /// - Strips URLs and email addresses
    /// - Replaces every character that is not a word character, whitespace or `-` with a space
    /// - Collapses whitespace runs and trims
    pub fn clean_text(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let lowered = self.fold(text).to_lowercase();
        let result = URL_REGEX.replace_all(&lowered, "");
        let result = EMAIL_REGEX.replace_all(&result, "");
        let result = SYMBOL_REGEX.replace_all(&result, " ");
        let result = WHITESPACE_COLLAPSE_REGEX.replace_all(&result, " ");

        result.trim().to_string()
    }

    /// Clean and split into whitespace-delimited tokens, in order.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.clean_text(text)
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Slide-level cleanup: collapse whitespace and drop `Page N` / `Slide N` markers.
    ///
    /// Case and punctuation are preserved so entity detection can still see them.
    pub fn clean_slide_text(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let folded = self.fold(text);
        let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(&folded, " ");
        let stripped = PAGE_MARKER_REGEX.replace_all(&collapsed, "");
        let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(&stripped, " ");

        collapsed.trim().to_string()
    }

    /// The first non-empty line, truncated to [`MAX_TITLE_CHARS`] plus [`ELLIPSIS`].
    pub fn extract_title(&self, text: &str) -> Option<String> {
        let first = text.lines().map(str::trim).find(|l| !l.is_empty())?;

        if first.chars().count() > MAX_TITLE_CHARS {
            let mut title: String = first.chars().take(MAX_TITLE_CHARS).collect();
            title.push_str(ELLIPSIS);
            Some(title)
        } else {
            Some(first.to_string())
        }
    }
}

/// Title-case a string: uppercase the first letter of each alphabetic run,
/// lowercase the rest. Digits and punctuation start a new run.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}
