//! Knowledge graph over analyzed slide decks.
//!
//! [`GraphBuilder`] writes presentations, slides, keywords, topics and
//! entities through a [`GraphSession`]; [`RelationshipDeriver`] adds topic
//! co-occurrence edges; [`QueryAggregator`] answers read-only questions.

pub mod builder;
pub mod cooccurrence;
pub mod error;
pub mod memory;
pub mod model;
pub mod query;
pub mod session;

pub use builder::{
    DuplicatePolicy, GraphBuilder, GraphStatistics, IngestOptions, LoadOutcome, LoadReport,
};
pub use cooccurrence::RelationshipDeriver;
pub use error::{Result, StoreError};
pub use memory::MemoryGraph;
pub use model::{
    EntityNode, KeywordNode, NodeHandle, NodeKey, NodeKind, NodeRecord, PresentationNode,
    RelKind, Relationship, RelationshipRecord, SlideNode, TopicNode,
};
pub use query::QueryAggregator;
pub use session::GraphSession;
