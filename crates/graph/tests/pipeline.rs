//! End-to-end ingest and query scenarios.

use deck_core::{Presentation, TextNormalizer};
use deck_graph::{
    GraphBuilder, GraphSession, MemoryGraph, NodeKey, NodeRecord, QueryAggregator, RelKind,
    Relationship, RelationshipDeriver,
};
use std::collections::BTreeMap;
use std::path::Path;

fn deck(filename: &str, pages: &[&str]) -> Presentation {
    Presentation::from_pages(
        Path::new(filename),
        pages.iter().copied(),
        BTreeMap::new(),
        &TextNormalizer::new(),
    )
}

fn related_strength(graph: &MemoryGraph, a: &str, b: &str) -> Option<u64> {
    let a = graph.find_node(&NodeKey::Topic(a.to_string())).unwrap()?;
    let b = graph.find_node(&NodeKey::Topic(b.to_string())).unwrap()?;
    graph
        .relationships(RelKind::RelatedTo)
        .unwrap()
        .into_iter()
        .find(|r| (r.source == a && r.target == b) || (r.source == b && r.target == a))
        .map(|r| match r.relationship {
            Relationship::RelatedTo { strength } => strength,
            _ => 0,
        })
}

#[test]
fn test_two_slide_kubernetes_docker_scenario() {
    let graph = MemoryGraph::new();
    GraphBuilder::new(&graph)
        .load_presentation(&deck(
            "containers.pdf",
            &["Kubernetes and Docker", "Kubernetes with Docker again"],
        ))
        .unwrap();
    RelationshipDeriver::new(&graph)
        .derive_topic_cooccurrence()
        .unwrap();

    assert_eq!(related_strength(&graph, "Kubernetes", "Docker"), Some(2));

    let top = QueryAggregator::new(&graph).top_topics(1).unwrap();
    assert_eq!(top.len(), 1);
    assert!(top[0].topic == "Kubernetes" || top[0].topic == "Docker");
    assert!(top[0].mentions >= 2);
}

#[test]
fn test_cooccurrence_symmetric_from_either_anchor() {
    let graph = MemoryGraph::new();
    GraphBuilder::new(&graph)
        .load_presentation(&deck(
            "pair.pdf",
            &["Kafka streams Flink", "Flink jobs Kafka topics", "Kafka Flink"],
        ))
        .unwrap();
    RelationshipDeriver::new(&graph)
        .derive_topic_cooccurrence()
        .unwrap();

    assert_eq!(related_strength(&graph, "Kafka", "Flink"), Some(3));
    assert_eq!(related_strength(&graph, "Flink", "Kafka"), Some(3));

    let queries = QueryAggregator::new(&graph);
    let clusters = queries.topic_clusters(1).unwrap();
    let kafka = clusters.iter().find(|c| c.main_topic == "Kafka").unwrap();
    let flink = clusters.iter().find(|c| c.main_topic == "Flink").unwrap();
    assert!(kafka.related_topics.contains(&"Flink".to_string()));
    assert!(flink.related_topics.contains(&"Kafka".to_string()));
}

#[test]
fn test_single_shared_slide_creates_no_relationship() {
    let graph = MemoryGraph::new();
    GraphBuilder::new(&graph)
        .load_presentation(&deck("once.pdf", &["Kubernetes and Docker", "Terraform only"]))
        .unwrap();
    RelationshipDeriver::new(&graph)
        .derive_topic_cooccurrence()
        .unwrap();

    assert_eq!(related_strength(&graph, "Kubernetes", "Docker"), None);
    assert!(graph.relationships(RelKind::RelatedTo).unwrap().is_empty());
}

#[test]
fn test_summary_of_missing_presentation_is_not_found() {
    let graph = MemoryGraph::new();
    GraphBuilder::new(&graph)
        .load_presentation(&deck("present.pdf", &["Kubernetes"]))
        .unwrap();

    let summary = QueryAggregator::new(&graph)
        .presentation_summary("nonexistent.pdf")
        .unwrap();
    assert!(summary.is_none());
}

#[test]
fn test_upsert_counter_tracks_increments() {
    let graph = MemoryGraph::new();
    let handle = graph.upsert_node(NodeRecord::keyword("observability")).unwrap();
    for _ in 0..4 {
        assert_eq!(graph.upsert_node(NodeRecord::keyword("observability")).unwrap(), handle);
    }

    let record = graph.node(handle).unwrap().unwrap();
    assert_eq!(record.counter(), Some(5));
}

#[test]
fn test_concurrent_loads_do_not_lose_increments() {
    let graph = MemoryGraph::new();
    let decks: Vec<Presentation> = (0..8)
        .map(|i| deck(&format!("deck{}.pdf", i), &["Kubernetes clusters", "Kubernetes upgrades"]))
        .collect();

    std::thread::scope(|scope| {
        for pres in &decks {
            let graph = &graph;
            scope.spawn(move || {
                GraphBuilder::new(graph).load_presentation(pres).unwrap();
            });
        }
    });

    let (_, topic) = graph
        .find_record(&NodeKey::Topic("Kubernetes".into()))
        .unwrap()
        .unwrap();
    assert_eq!(topic.counter(), Some(16));

    let top = QueryAggregator::new(&graph).top_topics(1).unwrap();
    assert_eq!(top[0].presentation_count, 8);
}

#[test]
fn test_snapshot_survives_reopen() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("store.json");

    {
        let graph = MemoryGraph::open(&path).unwrap();
        GraphBuilder::new(&graph)
            .load_presentation(&deck("saved.pdf", &["Kubernetes and Docker", "Kubernetes Docker"]))
            .unwrap();
        RelationshipDeriver::new(&graph)
            .derive_topic_cooccurrence()
            .unwrap();
        graph.save().unwrap();
    }

    let graph = MemoryGraph::open_existing(&path).unwrap();
    let summary = QueryAggregator::new(&graph)
        .presentation_summary("saved.pdf")
        .unwrap()
        .unwrap();
    assert_eq!(summary.total_slides, 2);
    assert_eq!(related_strength(&graph, "Docker", "Kubernetes"), Some(2));
}
