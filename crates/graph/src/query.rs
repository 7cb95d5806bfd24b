//! Read-only views over the knowledge graph: top topics, related
//! presentations, topic clusters, agenda suggestions and blog material.
//!
//! Lookups of unknown presentations or topics return `None` or an empty
//! list; they are not errors.

use crate::error::Result;
use crate::model::{
    NodeHandle, NodeKey, NodeKind, NodeRecord, PresentationNode, RelKind, Relationship,
};
use crate::session::GraphSession;
use deck_core::EntityKind;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Topics offered as keynote candidates.
const KEYNOTE_COUNT: usize = 5;
/// Clusters turned into tracks.
const TRACK_COUNT: usize = 5;
/// Topics considered by the agenda.
const AGENDA_TOPIC_COUNT: usize = 10;
/// Minimum `total_mentions` for an agenda track.
const TRACK_MIN_MENTIONS: u64 = 2;
/// Related topic names kept per cluster.
const CLUSTER_RELATED_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationInfo {
    pub filename: String,
    pub title: String,
    pub total_slides: usize,
}

/// A topic with its corpus-wide mention count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStat {
    pub topic: String,
    pub mentions: u64,
    /// Distinct presentations covering the topic.
    pub presentation_count: usize,
}

/// A presentation sharing covered topics with another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPresentation {
    pub filename: String,
    pub title: String,
    pub shared_topics: usize,
}

/// A topic together with its strongest neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCluster {
    pub main_topic: String,
    pub related_topics: Vec<String>,
    /// Titles of presentations covering the main topic.
    pub presentations: Vec<String>,
    pub total_mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// `Track {i}: {topic}`, numbered from 1.
    pub label: String,
    pub cluster: TopicCluster,
}

/// Suggested conference agenda.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agenda {
    pub keynote_topics: Vec<TopicStat>,
    pub tracks: Vec<Track>,
    pub popular_topics: Vec<String>,
}

/// How strongly a presentation covers a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCoverage {
    pub filename: String,
    pub title: String,
    pub mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub mentions: u64,
}

/// Summary of one presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationSummary {
    pub filename: String,
    pub title: String,
    pub total_slides: usize,
    pub top_topics: Vec<TopicCount>,
    pub key_entities: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationBrief {
    pub filename: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub name: String,
    pub kind: EntityKind,
}

/// Material for writing about one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogMaterial {
    pub topic: String,
    pub presentations: Vec<PresentationBrief>,
    pub related_topics: Vec<String>,
    pub entities: Vec<EntityRef>,
}

/// A presentation matching a search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub filename: String,
    pub title: String,
    pub matching_slides: usize,
}

/// Query front end over a graph session.
pub struct QueryAggregator<'a, S: GraphSession + ?Sized> {
    session: &'a S,
}

impl<'a, S: GraphSession + ?Sized> QueryAggregator<'a, S> {
    pub fn new(session: &'a S) -> Self {
        Self { session }
    }

    fn presentation(&self, filename: &str) -> Result<Option<(NodeHandle, PresentationNode)>> {
        let found = self
            .session
            .find_record(&NodeKey::Presentation(filename.to_string()))?;
        Ok(found.and_then(|(h, n)| match n {
            NodeRecord::Presentation(p) => Some((h, p)),
            _ => None,
        }))
    }

    fn presentation_at(&self, handle: NodeHandle) -> Result<Option<PresentationNode>> {
        Ok(self
            .session
            .node(handle)?
            .and_then(|n| n.as_presentation().cloned()))
    }

    fn topic_names(&self) -> Result<HashMap<NodeHandle, String>> {
        Ok(self
            .session
            .nodes(NodeKind::Topic)?
            .into_iter()
            .filter_map(|(h, n)| n.as_topic().map(|t| (h, t.name.clone())))
            .collect())
    }

    /// Topic names connected to `topic` by `RELATED_TO`, in edge order.
    fn related_names(
        &self,
        topic: NodeHandle,
        names: &HashMap<NodeHandle, String>,
    ) -> Result<Vec<String>> {
        let mut related = self.session.outgoing(topic, RelKind::RelatedTo)?;
        related.extend(self.session.incoming(topic, RelKind::RelatedTo)?);
        Ok(related
            .iter()
            .filter_map(|r| r.other(topic))
            .filter_map(|h| names.get(&h).cloned())
            .collect())
    }

    /// Slides of a presentation, in load order.
    fn slides_of(&self, presentation: NodeHandle) -> Result<Vec<NodeHandle>> {
        Ok(self
            .session
            .outgoing(presentation, RelKind::Contains)?
            .into_iter()
            .map(|r| r.target)
            .collect())
    }

    /// All presentations, ordered by title.
    pub fn all_presentations(&self) -> Result<Vec<PresentationInfo>> {
        let mut all: Vec<PresentationInfo> = self
            .session
            .nodes(NodeKind::Presentation)?
            .into_iter()
            .filter_map(|(_, n)| {
                n.as_presentation().map(|p| PresentationInfo {
                    filename: p.filename.clone(),
                    title: p.title.clone(),
                    total_slides: p.total_slides,
                })
            })
            .collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(all)
    }

    /// Most mentioned topics, each with the number of presentations covering it.
    pub fn top_topics(&self, limit: usize) -> Result<Vec<TopicStat>> {
        let mut coverage: HashMap<NodeHandle, HashSet<NodeHandle>> = HashMap::new();
        for covers in self.session.relationships(RelKind::Covers)? {
            coverage.entry(covers.target).or_default().insert(covers.source);
        }

        let mut stats: Vec<TopicStat> = self
            .session
            .nodes(NodeKind::Topic)?
            .into_iter()
            .filter_map(|(h, n)| {
                n.as_topic().map(|t| TopicStat {
                    topic: t.name.clone(),
                    mentions: t.total_mentions,
                    presentation_count: coverage.get(&h).map_or(0, HashSet::len),
                })
            })
            .collect();

        stats.sort_by(|a, b| b.mentions.cmp(&a.mentions));
        stats.truncate(limit);
        Ok(stats)
    }

    /// Presentations covering a topic, by the presentation's mention tally.
    pub fn presentations_by_topic(&self, topic: &str) -> Result<Vec<TopicCoverage>> {
        let Some(topic) = self.session.find_node(&NodeKey::Topic(topic.to_string()))? else {
            return Ok(Vec::new());
        };

        let mut coverage = Vec::new();
        for covers in self.session.incoming(topic, RelKind::Covers)? {
            let Relationship::Covers { total_mentions } = covers.relationship else {
                continue;
            };
            if let Some(p) = self.presentation_at(covers.source)? {
                coverage.push(TopicCoverage {
                    filename: p.filename,
                    title: p.title,
                    mentions: total_mentions,
                });
            }
        }

        coverage.sort_by(|a, b| b.mentions.cmp(&a.mentions));
        Ok(coverage)
    }

    /// Other presentations sharing covered topics with `filename`.
    pub fn related_presentations(
        &self,
        filename: &str,
        limit: usize,
    ) -> Result<Vec<RelatedPresentation>> {
        let Some((anchor, _)) = self.presentation(filename)? else {
            return Ok(Vec::new());
        };

        let covers = self.session.relationships(RelKind::Covers)?;
        let anchor_topics: HashSet<NodeHandle> = covers
            .iter()
            .filter(|r| r.source == anchor)
            .map(|r| r.target)
            .collect();

        let mut shared: IndexMap<NodeHandle, usize> = IndexMap::new();
        for r in &covers {
            if r.source != anchor && anchor_topics.contains(&r.target) {
                *shared.entry(r.source).or_insert(0) += 1;
            }
        }

        let mut related = Vec::with_capacity(shared.len());
        for (handle, shared_topics) in shared {
            if let Some(p) = self.presentation_at(handle)? {
                related.push(RelatedPresentation {
                    filename: p.filename,
                    title: p.title,
                    shared_topics,
                });
            }
        }

        related.sort_by(|a, b| b.shared_topics.cmp(&a.shared_topics));
        related.truncate(limit);
        Ok(related)
    }

    /// Topics with at least `min_mentions` mentions and at least one related
    /// topic, most mentioned first.
    pub fn topic_clusters(&self, min_mentions: u64) -> Result<Vec<TopicCluster>> {
        let names = self.topic_names()?;
        let mut clusters = Vec::new();

        for (handle, node) in self.session.nodes(NodeKind::Topic)? {
            let Some(topic) = node.as_topic() else {
                continue;
            };
            if topic.total_mentions < min_mentions {
                continue;
            }

            let mut related = self.related_names(handle, &names)?;
            if related.is_empty() {
                continue;
            }
            related.truncate(CLUSTER_RELATED_LIMIT);

            let mut presentations = Vec::new();
            for covers in self.session.incoming(handle, RelKind::Covers)? {
                if let Some(p) = self.presentation_at(covers.source)? {
                    presentations.push(p.title);
                }
            }

            clusters.push(TopicCluster {
                main_topic: topic.name.clone(),
                related_topics: related,
                presentations,
                total_mentions: topic.total_mentions,
            });
        }

        clusters.sort_by(|a, b| b.total_mentions.cmp(&a.total_mentions));
        Ok(clusters)
    }

    /// Keynote candidates, track suggestions and popular topics.
    pub fn generate_agenda(&self) -> Result<Agenda> {
        let top = self.top_topics(AGENDA_TOPIC_COUNT)?;

        let tracks = self
            .topic_clusters(TRACK_MIN_MENTIONS)?
            .into_iter()
            .take(TRACK_COUNT)
            .enumerate()
            .map(|(i, cluster)| Track {
                label: format!("Track {}: {}", i + 1, cluster.main_topic),
                cluster,
            })
            .collect();

        Ok(Agenda {
            keynote_topics: top.iter().take(KEYNOTE_COUNT).cloned().collect(),
            tracks,
            popular_topics: top.into_iter().map(|t| t.topic).collect(),
        })
    }

    /// Title, slide count, top topics, entities and keywords of a presentation.
    pub fn presentation_summary(&self, filename: &str) -> Result<Option<PresentationSummary>> {
        let Some((handle, presentation)) = self.presentation(filename)? else {
            return Ok(None);
        };
        let names = self.topic_names()?;

        let mut top_topics: Vec<TopicCount> = self
            .session
            .outgoing(handle, RelKind::Covers)?
            .into_iter()
            .filter_map(|r| match r.relationship {
                Relationship::Covers { total_mentions } => names.get(&r.target).map(|n| TopicCount {
                    topic: n.clone(),
                    mentions: total_mentions,
                }),
                _ => None,
            })
            .collect();
        top_topics.sort_by(|a, b| b.mentions.cmp(&a.mentions));
        top_topics.truncate(10);

        let mut entities: IndexSet<String> = IndexSet::new();
        let mut keywords: IndexSet<String> = IndexSet::new();
        for slide in self.slides_of(handle)? {
            for r in self.session.outgoing(slide, RelKind::References)? {
                if let Some(e) = self.session.node(r.target)?.and_then(|n| n.as_entity().cloned()) {
                    entities.insert(e.name);
                }
            }
            for r in self.session.outgoing(slide, RelKind::ContainsKeyword)? {
                let keyword = self.session.node(r.target)?;
                if let Some(k) = keyword.and_then(|n| n.as_keyword().cloned()) {
                    keywords.insert(k.term);
                }
            }
        }

        Ok(Some(PresentationSummary {
            filename: presentation.filename,
            title: presentation.title,
            total_slides: presentation.total_slides,
            top_topics,
            key_entities: entities.into_iter().take(10).collect(),
            keywords: keywords.into_iter().take(15).collect(),
        }))
    }

    /// Presentations, related topics and co-occurring entities for a topic.
    pub fn blog_post_material(&self, topic: &str) -> Result<Option<BlogMaterial>> {
        let Some(handle) = self.session.find_node(&NodeKey::Topic(topic.to_string()))? else {
            return Ok(None);
        };

        let mut presentations = Vec::new();
        for coverage in self.presentations_by_topic(topic)?.into_iter().take(5) {
            if let Some(summary) = self.presentation_summary(&coverage.filename)? {
                presentations.push(PresentationBrief {
                    filename: summary.filename,
                    title: summary.title,
                    keywords: summary.keywords.into_iter().take(10).collect(),
                    entities: summary.key_entities,
                });
            }
        }

        let names = self.topic_names()?;
        let mut related_topics = self.related_names(handle, &names)?;
        related_topics.truncate(10);

        let mut entities: IndexSet<(String, EntityKind)> = IndexSet::new();
        for mention in self.session.incoming(handle, RelKind::Mentions)? {
            for r in self.session.outgoing(mention.source, RelKind::References)? {
                if let Some(e) = self.session.node(r.target)?.and_then(|n| n.as_entity().cloned()) {
                    entities.insert((e.name, e.kind));
                }
            }
        }

        Ok(Some(BlogMaterial {
            topic: topic.to_string(),
            presentations,
            related_topics,
            entities: entities
                .into_iter()
                .take(10)
                .map(|(name, kind)| EntityRef { name, kind })
                .collect(),
        }))
    }

    /// Case-insensitive search over presentation titles and slide content.
    ///
    /// A title match counts every slide of that presentation.
    pub fn search_presentations(&self, keyword: &str) -> Result<Vec<SearchHit>> {
        let needle = keyword.to_lowercase();
        let mut hits = Vec::new();

        for (handle, node) in self.session.nodes(NodeKind::Presentation)? {
            let Some(presentation) = node.as_presentation() else {
                continue;
            };
            let title_match = presentation.title.to_lowercase().contains(&needle);

            let mut matching_slides = 0;
            for slide in self.slides_of(handle)? {
                let content_match = self
                    .session
                    .node(slide)?
                    .and_then(|n| n.as_slide().map(|s| s.content.to_lowercase().contains(&needle)))
                    .unwrap_or(false);
                if title_match || content_match {
                    matching_slides += 1;
                }
            }

            if matching_slides > 0 {
                hits.push(SearchHit {
                    filename: presentation.filename.clone(),
                    title: presentation.title.clone(),
                    matching_slides,
                });
            }
        }

        hits.sort_by(|a, b| b.matching_slides.cmp(&a.matching_slides));
        Ok(hits)
    }
}
