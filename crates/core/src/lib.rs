//! Core domain types, text normalization, and content analysis
//! (keywords, topics, entities) for slide deck knowledge graphs.

pub mod analysis;
pub mod entities;
pub mod error;
pub mod keywords;
pub mod normalize;
pub mod topics;
pub mod types;

pub use analysis::{AnalysisConfig, ContentAnalysis, ContentAnalyzer};
pub use entities::{Entity, EntityKind, EntityRecognizer};
pub use error::{Error, Result};
pub use keywords::{Keyword, KeywordExtractor};
pub use normalize::TextNormalizer;
pub use topics::{Topic, TopicSynthesizer};
pub use types::{Presentation, Slide};
