//! Topic co-occurrence relationships.

use crate::error::Result;
use crate::model::{NodeHandle, NodeKind, RelKind, Relationship};
use crate::session::GraphSession;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Pairs seen on this many slides or fewer are not materialized.
const MIN_SHARED_SLIDES_EXCLUSIVE: u64 = 1;

/// Derives `RELATED_TO` edges between topics mentioned on the same slides.
///
/// Run after all ingests for a session have finished; a run concurrent with
/// ingest sees a partial snapshot and under-counts.
pub struct RelationshipDeriver<'a, S: GraphSession + ?Sized> {
    session: &'a S,
}

impl<'a, S: GraphSession + ?Sized> RelationshipDeriver<'a, S> {
    pub fn new(session: &'a S) -> Self {
        Self { session }
    }

    /// Count, for every unordered topic pair, the distinct slides mentioning
    /// both. The pair key is ordered by topic name.
    pub fn cooccurrence_counts(&self) -> Result<BTreeMap<(String, String), u64>> {
        let topic_names: HashMap<NodeHandle, String> = self
            .session
            .nodes(NodeKind::Topic)?
            .into_iter()
            .filter_map(|(h, n)| n.as_topic().map(|t| (h, t.name.clone())))
            .collect();

        let mut per_slide: BTreeMap<NodeHandle, BTreeSet<&str>> = BTreeMap::new();
        for mention in self.session.relationships(RelKind::Mentions)? {
            if let Some(name) = topic_names.get(&mention.target) {
                per_slide
                    .entry(mention.source)
                    .or_default()
                    .insert(name.as_str());
            }
        }

        let mut counts: BTreeMap<(String, String), u64> = BTreeMap::new();
        for topics in per_slide.values() {
            let topics: Vec<&str> = topics.iter().copied().collect();
            for (i, first) in topics.iter().enumerate() {
                for second in &topics[i + 1..] {
                    *counts
                        .entry((first.to_string(), second.to_string()))
                        .or_insert(0) += 1;
                }
            }
        }

        Ok(counts)
    }

    /// Recompute all topic co-occurrence edges from scratch.
    ///
    /// Existing `RELATED_TO` edges are replaced, so repeated runs over the
    /// same graph give the same strengths. Returns the number of edges written.
    pub fn derive_topic_cooccurrence(&self) -> Result<usize> {
        log::info!("Creating topic relationships...");

        let counts = self.cooccurrence_counts()?;
        let handles: HashMap<String, NodeHandle> = self
            .session
            .nodes(NodeKind::Topic)?
            .into_iter()
            .filter_map(|(h, n)| n.as_topic().map(|t| (t.name.clone(), h)))
            .collect();

        let removed = self.session.delete_relationships(RelKind::RelatedTo)?;
        if removed > 0 {
            log::debug!("Removed {} stale topic relationships", removed);
        }

        let mut created = 0;
        for ((first, second), strength) in counts {
            if strength <= MIN_SHARED_SLIDES_EXCLUSIVE {
                continue;
            }
            let (Some(&source), Some(&target)) = (handles.get(&first), handles.get(&second)) else {
                continue;
            };
            self.session
                .create_relationship(source, target, Relationship::RelatedTo { strength })?;
            created += 1;
        }

        log::info!("Created {} topic relationships", created);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGraph;
    use crate::model::{NodeRecord, SlideNode};

    fn slide(graph: &MemoryGraph, number: u32) -> NodeHandle {
        graph
            .create_node(NodeRecord::Slide(SlideNode {
                presentation_filename: "t.pdf".into(),
                slide_number: number,
                title: None,
                content: String::new(),
                raw_text: String::new(),
            }))
            .unwrap()
    }

    fn mention(graph: &MemoryGraph, slide: NodeHandle, topic: &str) {
        let t = graph.upsert_node(NodeRecord::topic(topic)).unwrap();
        graph
            .create_relationship(slide, t, Relationship::Mentions { relevance_score: 1.0 })
            .unwrap();
    }

    #[test]
    fn test_single_slide_pair_not_materialized() {
        let graph = MemoryGraph::new();
        let s1 = slide(&graph, 1);
        mention(&graph, s1, "Docker");
        mention(&graph, s1, "Kubernetes");

        let deriver = RelationshipDeriver::new(&graph);
        assert_eq!(deriver.derive_topic_cooccurrence().unwrap(), 0);
        assert_eq!(
            deriver.cooccurrence_counts().unwrap().get(&("Docker".into(), "Kubernetes".into())),
            Some(&1)
        );
    }

    #[test]
    fn test_strength_counts_distinct_slides() {
        let graph = MemoryGraph::new();
        for n in 1..=3 {
            let s = slide(&graph, n);
            mention(&graph, s, "Kubernetes");
            mention(&graph, s, "Docker");
        }

        let deriver = RelationshipDeriver::new(&graph);
        assert_eq!(deriver.derive_topic_cooccurrence().unwrap(), 1);

        let related = graph.relationships(RelKind::RelatedTo).unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].relationship, Relationship::RelatedTo { strength: 3 });

        // Canonical orientation: smaller name is the source.
        let source = graph.node(related[0].source).unwrap().unwrap();
        assert_eq!(source.as_topic().unwrap().name, "Docker");
    }

    #[test]
    fn test_rerun_is_stable() {
        let graph = MemoryGraph::new();
        for n in 1..=2 {
            let s = slide(&graph, n);
            mention(&graph, s, "Alpha");
            mention(&graph, s, "Beta");
            mention(&graph, s, "Gamma");
        }

        let deriver = RelationshipDeriver::new(&graph);
        assert_eq!(deriver.derive_topic_cooccurrence().unwrap(), 3);
        let first = graph.relationships(RelKind::RelatedTo).unwrap();
        assert_eq!(deriver.derive_topic_cooccurrence().unwrap(), 3);
        assert_eq!(graph.relationships(RelKind::RelatedTo).unwrap(), first);
    }
}
