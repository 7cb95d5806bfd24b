//! Domain types for representing extracted presentation content.
//!
//! These mirror what the text-extraction service hands over: one
//! [`Presentation`] per document, with one [`Slide`] per page.

use crate::error::{Error, Result};
use crate::normalize::{title_case, TextNormalizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Represents an entire presentation with its extracted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Original filename (without path). This is the presentation's natural key.
    pub filename: String,

    /// Absolute path of the source document.
    pub filepath: String,

    /// Display title.
    pub title: String,

    /// Number of slides in the document.
    pub total_slides: usize,

    /// Slides in presentation order.
    #[serde(default)]
    pub slides: Vec<Slide>,

    /// Free-form document metadata (author, producer, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Presentation {
    /// Assemble a presentation from per-page raw text.
    ///
    /// Slides are numbered from 1 in iteration order. The title comes from the
    /// first slide when it is descriptive enough, otherwise from the filename.
    pub fn from_pages<I, T>(
        path: &Path,
        pages: I,
        metadata: BTreeMap<String, String>,
        normalizer: &TextNormalizer,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let slides: Vec<Slide> = pages
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| Slide::from_raw_text(idx as u32 + 1, raw, normalizer))
            .collect();

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let filepath = std::path::absolute(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
            .to_string();

        let first_slide_text = slides.first().map(|s| s.raw_text.as_str());
        let title = presentation_title(path, first_slide_text, normalizer);

        Self {
            filename,
            filepath,
            title,
            total_slides: slides.len(),
            slides,
            metadata,
        }
    }

    /// Check that `total_slides` matches the slide list and that slide
    /// numbers are exactly `1..=n`, in any order.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidPresentation {
            filename: self.filename.clone(),
            reason,
        };

        if self.total_slides != self.slides.len() {
            return Err(invalid(format!(
                "total_slides is {} but {} slides are present",
                self.total_slides,
                self.slides.len()
            )));
        }

        let mut numbers: Vec<u32> = self.slides.iter().map(|s| s.slide_number).collect();
        numbers.sort_unstable();
        for (expected, &actual) in (1u32..).zip(&numbers) {
            if actual != expected {
                return Err(invalid(format!(
                    "slide numbers must run 1..={}, found {} where {} was expected",
                    numbers.len(),
                    actual,
                    expected
                )));
            }
        }
        Ok(())
    }
}

/// A single extracted slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub slide_number: u32,

    /// First non-empty line of the slide, truncated for display.
    pub title: Option<String>,

    /// Whitespace-collapsed content with page markers removed. Case is preserved.
    pub content: String,

    /// Text exactly as the extractor produced it.
    pub raw_text: String,
}

impl Slide {
    /// Build a slide from raw page text.
    pub fn from_raw_text(
        slide_number: u32,
        raw_text: impl Into<String>,
        normalizer: &TextNormalizer,
    ) -> Self {
        let raw_text = raw_text.into();
        Self {
            slide_number,
            title: normalizer.extract_title(&raw_text),
            content: normalizer.clean_slide_text(&raw_text),
            raw_text,
        }
    }

    /// Composite natural key: `filename:slide_number`.
    pub fn key(&self, filename: &str) -> String {
        format!("{}:{}", filename, self.slide_number)
    }
}

/// Pick a presentation title.
///
/// Uses the first slide's title when it is longer than 10 characters,
/// otherwise the file stem with separators turned into spaces, title-cased.
pub fn presentation_title(
    path: &Path,
    first_slide_text: Option<&str>,
    normalizer: &TextNormalizer,
) -> String {
    if let Some(title) = first_slide_text.and_then(|t| normalizer.extract_title(t)) {
        if title.chars().count() > 10 {
            return title;
        }
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .replace(['_', '-'], " ");
    title_case(&stem)
}
