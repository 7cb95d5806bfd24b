//! Writes analyzed presentations into the graph.

use crate::error::{Result, StoreError};
use crate::model::{NodeHandle, NodeKey, NodeKind, NodeRecord, RelKind, Relationship, SlideNode};
use crate::session::GraphSession;
use deck_core::{AnalysisConfig, ContentAnalyzer, EntityKind, Presentation, Slide};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do when a presentation with the same filename is already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Fail with [`StoreError::DuplicatePresentation`].
    #[default]
    Reject,
    /// Keep the existing data and do nothing.
    Skip,
    /// Retract the earlier load, including its counter contributions, then load again.
    Replace,
}

/// Ingest tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Topics linked per slide.
    pub topics_per_slide: usize,
    /// Keywords linked per slide.
    pub keywords_per_slide: usize,
    pub on_duplicate: DuplicatePolicy,
    /// Analysis settings applied to each slide.
    pub analysis: AnalysisConfig,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            topics_per_slide: 5,
            keywords_per_slide: 10,
            on_duplicate: DuplicatePolicy::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl IngestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topics_per_slide(mut self, n: usize) -> Self {
        self.topics_per_slide = n;
        self
    }

    pub fn with_keywords_per_slide(mut self, n: usize) -> Self {
        self.keywords_per_slide = n;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate = policy;
        self
    }

    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }
}

/// Counts of what one presentation load wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub filename: String,
    pub slides: usize,
    pub topic_mentions: usize,
    pub keyword_links: usize,
    pub entity_references: usize,
    pub covered_topics: usize,
}

/// Result of [`GraphBuilder::load_presentation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(LoadReport),
    /// An earlier load was retracted first.
    Replaced(LoadReport),
    /// Already present and the policy is [`DuplicatePolicy::Skip`].
    Skipped,
}

/// Node and relationship counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub presentations: usize,
    pub slides: usize,
    pub topics: usize,
    pub keywords: usize,
    pub entities: usize,
    pub relationships: usize,
}

impl fmt::Display for GraphStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Presentations: {}", self.presentations)?;
        writeln!(f, "  Slides: {}", self.slides)?;
        writeln!(f, "  Topics: {}", self.topics)?;
        writeln!(f, "  Keywords: {}", self.keywords)?;
        writeln!(f, "  Entities: {}", self.entities)?;
        write!(f, "  Relationships: {}", self.relationships)
    }
}

/// Builds the knowledge graph from presentations.
///
/// Slides of one presentation are processed in slide-number order because
/// the per-presentation topic tally accumulates across them. Different
/// presentations may be loaded from different threads sharing a session.
pub struct GraphBuilder<'a, S: GraphSession + ?Sized> {
    session: &'a S,
    analyzer: ContentAnalyzer,
    options: IngestOptions,
}

impl<'a, S: GraphSession + ?Sized> GraphBuilder<'a, S> {
    /// Create a builder with default options.
    pub fn new(session: &'a S) -> Self {
        Self::with_options(session, IngestOptions::default())
    }

    pub fn with_options(session: &'a S, options: IngestOptions) -> Self {
        Self {
            session,
            analyzer: ContentAnalyzer::new(options.analysis.clone()),
            options,
        }
    }

    /// Upsert a topic, incrementing `total_mentions`.
    pub fn upsert_topic(&self, name: &str) -> Result<NodeHandle> {
        self.session.upsert_node(NodeRecord::topic(name))
    }

    /// Upsert a keyword, incrementing `total_frequency`.
    pub fn upsert_keyword(&self, term: &str) -> Result<NodeHandle> {
        self.session.upsert_node(NodeRecord::keyword(term))
    }

    /// Upsert an entity, incrementing `total_mentions`.
    pub fn upsert_entity(&self, name: &str, kind: EntityKind) -> Result<NodeHandle> {
        self.session.upsert_node(NodeRecord::entity(name, kind))
    }

    /// Load a presentation and all of its slides.
    ///
    /// The document is validated before anything is written. If a write
    /// fails partway, everything this load added is retracted again.
    pub fn load_presentation(&self, presentation: &Presentation) -> Result<LoadOutcome> {
        presentation.validate()?;
        let filename = &presentation.filename;
        let key = NodeKey::Presentation(filename.clone());

        let mut replaced = false;
        if let Some(existing) = self.session.find_node(&key)? {
            match self.options.on_duplicate {
                DuplicatePolicy::Reject => {
                    return Err(StoreError::DuplicatePresentation(filename.clone()));
                }
                DuplicatePolicy::Skip => {
                    log::info!("Skipping already loaded presentation {}", filename);
                    return Ok(LoadOutcome::Skipped);
                }
                DuplicatePolicy::Replace => {
                    log::info!("Replacing previously loaded presentation {}", filename);
                    self.retract_presentation(existing)?;
                    replaced = true;
                }
            }
        }

        log::info!("Loading: {}", filename);
        let presentation_node = self
            .session
            .create_node(NodeRecord::Presentation(presentation.into()))?;

        let report = match self.load_contents(presentation_node, presentation) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Rolling back partial load of {}: {}", filename, e);
                if let Err(rollback) = self.retract_presentation(presentation_node) {
                    log::error!("Rollback of {} failed: {}", filename, rollback);
                }
                return Err(e);
            }
        };

        log::info!(
            "Loaded {} slides from {} ({} topics covered)",
            report.slides,
            filename,
            report.covered_topics
        );

        Ok(if replaced {
            LoadOutcome::Replaced(report)
        } else {
            LoadOutcome::Loaded(report)
        })
    }

    /// Slides in number order, then the per-presentation topic tally.
    fn load_contents(
        &self,
        presentation_node: NodeHandle,
        presentation: &Presentation,
    ) -> Result<LoadReport> {
        let filename = &presentation.filename;
        let mut report = LoadReport {
            filename: filename.clone(),
            ..LoadReport::default()
        };
        let mut tally: IndexMap<String, (NodeHandle, u64)> = IndexMap::new();

        let mut slides: Vec<&Slide> = presentation.slides.iter().collect();
        slides.sort_by_key(|s| s.slide_number);

        for slide in slides {
            self.load_slide(presentation_node, filename, slide, &mut tally, &mut report)?;
        }

        for (topic, mentions) in tally.values() {
            self.session.create_relationship(
                presentation_node,
                *topic,
                Relationship::Covers {
                    total_mentions: *mentions,
                },
            )?;
        }
        report.covered_topics = tally.len();
        Ok(report)
    }

    fn load_slide(
        &self,
        presentation_node: NodeHandle,
        filename: &str,
        slide: &Slide,
        tally: &mut IndexMap<String, (NodeHandle, u64)>,
        report: &mut LoadReport,
    ) -> Result<()> {
        let slide_node = self
            .session
            .create_node(NodeRecord::Slide(SlideNode::new(filename, slide)))?;
        self.session
            .create_relationship(presentation_node, slide_node, Relationship::Contains)?;

        // Slide-local scope: each slide is analyzed on its own content.
        let analysis = self.analyzer.analyze(&slide.content);

        for topic in analysis.topics.iter().take(self.options.topics_per_slide) {
            let handle = self.upsert_topic(&topic.name)?;
            self.session.create_relationship(
                slide_node,
                handle,
                Relationship::Mentions {
                    relevance_score: topic.relevance_score,
                },
            )?;
            tally.entry(topic.name.clone()).or_insert((handle, 0)).1 += 1;
            report.topic_mentions += 1;
        }

        for keyword in analysis.keywords.iter().take(self.options.keywords_per_slide) {
            let handle = self.upsert_keyword(&keyword.term)?;
            self.session.create_relationship(
                slide_node,
                handle,
                Relationship::ContainsKeyword {
                    frequency: keyword.frequency,
                },
            )?;
            report.keyword_links += 1;
        }

        for entity in &analysis.entities {
            let handle = self.upsert_entity(&entity.name, entity.kind)?;
            self.session.create_relationship(
                slide_node,
                handle,
                Relationship::References {
                    frequency: entity.frequency,
                },
            )?;
            report.entity_references += 1;
        }

        log::debug!(
            "Slide {}: {} topics, {} keywords, {} entities",
            slide.key(filename),
            analysis.topics.len().min(self.options.topics_per_slide),
            analysis.keywords.len().min(self.options.keywords_per_slide),
            analysis.entities.len()
        );
        report.slides += 1;
        Ok(())
    }

    /// Remove a presentation, its slides and their relationships.
    ///
    /// Every slide relationship contributed one counter increment, so each
    /// one removed takes one back. Nodes left at zero are deleted.
    fn retract_presentation(&self, presentation_node: NodeHandle) -> Result<()> {
        for contains in self.session.outgoing(presentation_node, RelKind::Contains)? {
            let slide = contains.target;
            for kind in [RelKind::Mentions, RelKind::ContainsKeyword, RelKind::References] {
                for rel in self.session.outgoing(slide, kind)? {
                    match self.session.adjust_counter(rel.target, -1) {
                        Ok(0) => self.session.delete_node(rel.target)?,
                        Ok(_) | Err(StoreError::NodeNotFound(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
            }
            self.session.delete_node(slide)?;
        }
        self.session.delete_node(presentation_node)
    }

    /// Node and relationship counts.
    pub fn statistics(&self) -> Result<GraphStatistics> {
        let count = |kind: NodeKind| self.session.nodes(kind).map(|n| n.len());

        let mut relationships = 0;
        for kind in [
            RelKind::Contains,
            RelKind::Mentions,
            RelKind::ContainsKeyword,
            RelKind::References,
            RelKind::Covers,
            RelKind::RelatedTo,
            RelKind::AssociatedWith,
        ] {
            relationships += self.session.relationships(kind)?.len();
        }

        Ok(GraphStatistics {
            presentations: count(NodeKind::Presentation)?,
            slides: count(NodeKind::Slide)?,
            topics: count(NodeKind::Topic)?,
            keywords: count(NodeKind::Keyword)?,
            entities: count(NodeKind::Entity)?,
            relationships,
        })
    }

    /// Remove everything from the store.
    pub fn clear(&self) -> Result<()> {
        self.session.clear()
    }
}
