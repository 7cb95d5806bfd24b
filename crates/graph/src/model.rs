//! Typed node and relationship records.

use deck_core::{EntityKind, Presentation, Slide};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable handle to a stored node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Presentation,
    Slide,
    Keyword,
    Topic,
    Entity,
}

/// Natural key of a node. Unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKey {
    Presentation(String),
    Slide { filename: String, slide_number: u32 },
    Keyword(String),
    Topic(String),
    Entity { name: String, kind: EntityKind },
}

impl NodeKey {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Presentation(_) => NodeKind::Presentation,
            Self::Slide { .. } => NodeKind::Slide,
            Self::Keyword(_) => NodeKind::Keyword,
            Self::Topic(_) => NodeKind::Topic,
            Self::Entity { .. } => NodeKind::Entity,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presentation(filename) => write!(f, "Presentation({})", filename),
            Self::Slide {
                filename,
                slide_number,
            } => write!(f, "Slide({}:{})", filename, slide_number),
            Self::Keyword(term) => write!(f, "Keyword({})", term),
            Self::Topic(name) => write!(f, "Topic({})", name),
            Self::Entity { name, kind } => write!(f, "Entity({}, {})", name, kind),
        }
    }
}

/// A loaded presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationNode {
    pub filename: String,
    pub title: String,
    pub filepath: String,
    pub total_slides: usize,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl From<&Presentation> for PresentationNode {
    fn from(p: &Presentation) -> Self {
        Self {
            filename: p.filename.clone(),
            title: p.title.clone(),
            filepath: p.filepath.clone(),
            total_slides: p.total_slides,
            metadata: p.metadata.clone(),
        }
    }
}

/// One slide of a presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideNode {
    pub presentation_filename: String,
    pub slide_number: u32,
    pub title: Option<String>,
    pub content: String,
    pub raw_text: String,
}

impl SlideNode {
    pub fn new(filename: &str, slide: &Slide) -> Self {
        Self {
            presentation_filename: filename.to_string(),
            slide_number: slide.slide_number,
            title: slide.title.clone(),
            content: slide.content.clone(),
            raw_text: slide.raw_text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordNode {
    pub term: String,
    pub total_frequency: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNode {
    pub name: String,
    pub total_mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNode {
    pub name: String,
    pub kind: EntityKind,
    pub total_mentions: u64,
}

/// A stored node, one variant per label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "label")]
pub enum NodeRecord {
    Presentation(PresentationNode),
    Slide(SlideNode),
    Keyword(KeywordNode),
    Topic(TopicNode),
    Entity(EntityNode),
}

impl NodeRecord {
    pub fn keyword(term: impl Into<String>) -> Self {
        Self::Keyword(KeywordNode {
            term: term.into(),
            total_frequency: 0,
        })
    }

    pub fn topic(name: impl Into<String>) -> Self {
        Self::Topic(TopicNode {
            name: name.into(),
            total_mentions: 0,
        })
    }

    pub fn entity(name: impl Into<String>, kind: EntityKind) -> Self {
        Self::Entity(EntityNode {
            name: name.into(),
            kind,
            total_mentions: 0,
        })
    }

    pub fn key(&self) -> NodeKey {
        match self {
            Self::Presentation(p) => NodeKey::Presentation(p.filename.clone()),
            Self::Slide(s) => NodeKey::Slide {
                filename: s.presentation_filename.clone(),
                slide_number: s.slide_number,
            },
            Self::Keyword(k) => NodeKey::Keyword(k.term.clone()),
            Self::Topic(t) => NodeKey::Topic(t.name.clone()),
            Self::Entity(e) => NodeKey::Entity {
                name: e.name.clone(),
                kind: e.kind,
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Presentation(_) => NodeKind::Presentation,
            Self::Slide(_) => NodeKind::Slide,
            Self::Keyword(_) => NodeKind::Keyword,
            Self::Topic(_) => NodeKind::Topic,
            Self::Entity(_) => NodeKind::Entity,
        }
    }

    /// Running counter: `total_frequency` for keywords, `total_mentions`
    /// for topics and entities. Presentations and slides have none.
    pub fn counter(&self) -> Option<u64> {
        match self {
            Self::Keyword(k) => Some(k.total_frequency),
            Self::Topic(t) => Some(t.total_mentions),
            Self::Entity(e) => Some(e.total_mentions),
            Self::Presentation(_) | Self::Slide(_) => None,
        }
    }

    pub fn counter_mut(&mut self) -> Option<&mut u64> {
        match self {
            Self::Keyword(k) => Some(&mut k.total_frequency),
            Self::Topic(t) => Some(&mut t.total_mentions),
            Self::Entity(e) => Some(&mut e.total_mentions),
            Self::Presentation(_) | Self::Slide(_) => None,
        }
    }

    pub fn as_presentation(&self) -> Option<&PresentationNode> {
        match self {
            Self::Presentation(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_slide(&self) -> Option<&SlideNode> {
        match self {
            Self::Slide(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&KeywordNode> {
        match self {
            Self::Keyword(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_topic(&self) -> Option<&TopicNode> {
        match self {
            Self::Topic(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityNode> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }
}

/// Relationship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelKind {
    Contains,
    Mentions,
    ContainsKeyword,
    References,
    Covers,
    RelatedTo,
    AssociatedWith,
}

impl RelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "CONTAINS",
            Self::Mentions => "MENTIONS",
            Self::ContainsKeyword => "CONTAINS_KEYWORD",
            Self::References => "REFERENCES",
            Self::Covers => "COVERS",
            Self::RelatedTo => "RELATED_TO",
            Self::AssociatedWith => "ASSOCIATED_WITH",
        }
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relationship with its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Relationship {
    /// Presentation -> Slide.
    Contains,
    /// Slide -> Topic.
    Mentions { relevance_score: f64 },
    /// Slide -> Keyword, with that slide's frequency.
    ContainsKeyword { frequency: u32 },
    /// Slide -> Entity, with that slide's frequency.
    References { frequency: u32 },
    /// Presentation -> Topic, with the presentation's mention tally.
    Covers { total_mentions: u64 },
    /// Topic <-> Topic. Stored once, smaller topic name as source.
    RelatedTo { strength: u64 },
    /// Entity -> Topic. Not written by ingest.
    AssociatedWith,
}

impl Relationship {
    pub fn kind(&self) -> RelKind {
        match self {
            Self::Contains => RelKind::Contains,
            Self::Mentions { .. } => RelKind::Mentions,
            Self::ContainsKeyword { .. } => RelKind::ContainsKeyword,
            Self::References { .. } => RelKind::References,
            Self::Covers { .. } => RelKind::Covers,
            Self::RelatedTo { .. } => RelKind::RelatedTo,
            Self::AssociatedWith => RelKind::AssociatedWith,
        }
    }
}

/// A stored relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub source: NodeHandle,
    pub target: NodeHandle,
    pub relationship: Relationship,
}

impl RelationshipRecord {
    pub fn kind(&self) -> RelKind {
        self.relationship.kind()
    }

    /// The endpoint opposite `node`, if `node` is one of the endpoints.
    pub fn other(&self, node: NodeHandle) -> Option<NodeHandle> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}
