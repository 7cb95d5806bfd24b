//! Error types for slide deck extraction and analysis.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a document into a [`crate::Presentation`].
///
/// Text analysis itself never fails; these cover the extraction boundary
/// and the shape of extracted documents.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The document's slides are not numbered 1..=n, or disagree with
    /// `total_slides`.
    #[error("Invalid presentation {filename}: {reason}")]
    InvalidPresentation { filename: String, reason: String },

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),
}
