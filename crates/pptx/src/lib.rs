//! PPTX (Office Open XML) text extraction.
//!
//! Reads .pptx files, which are ZIP archives containing XML documents, into
//! the [`deck_core::Presentation`] structure the graph pipeline consumes.

pub mod parser;

pub use parser::PptxExtractor;
