//! Human-readable query output.

use deck_graph::query::{
    Agenda, BlogMaterial, PresentationSummary, RelatedPresentation, SearchHit, TopicStat,
};
use std::fmt::Write;

pub fn render_agenda(agenda: &Agenda) -> String {
    let mut out = String::from("=== Agenda Suggestions ===\n\nKEYNOTE TOPICS:\n");
    for topic in &agenda.keynote_topics {
        let _ = writeln!(
            out,
            "  - {} ({} presentations, {} mentions)",
            topic.topic, topic.presentation_count, topic.mentions
        );
    }

    out.push_str("\nSUGGESTED TRACKS:\n");
    for track in &agenda.tracks {
        let related: Vec<&str> = track
            .cluster
            .related_topics
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        let _ = writeln!(out, "\n{}:", track.label);
        let _ = writeln!(out, "  Related: {}", related.join(", "));
        let _ = writeln!(out, "  Presentations: {}", track.cluster.presentations.len());
    }

    if !agenda.popular_topics.is_empty() {
        let _ = writeln!(out, "\nPOPULAR TOPICS: {}", agenda.popular_topics.join(", "));
    }
    out
}

pub fn render_topics(topics: &[TopicStat]) -> String {
    let mut out = String::from("=== Top Topics ===\n\n");
    for topic in topics {
        let _ = writeln!(
            out,
            "  {}: {} mentions in {} presentations",
            topic.topic, topic.mentions, topic.presentation_count
        );
    }
    out
}

pub fn render_search(query: &str, hits: &[SearchHit]) -> String {
    let mut out = format!("=== Search Results for '{}' ===\n\n", query);
    if hits.is_empty() {
        out.push_str("  No matches\n");
    }
    for hit in hits {
        let _ = writeln!(out, "  {}", hit.title);
        let _ = writeln!(out, "    ({} matching slides)", hit.matching_slides);
    }
    out
}

pub fn render_summary(summary: Option<&PresentationSummary>) -> String {
    let mut out = String::from("=== Presentation Summary ===\n\n");
    let Some(summary) = summary else {
        out.push_str("Presentation not found\n");
        return out;
    };

    let _ = writeln!(out, "Title: {}", summary.title);
    let _ = writeln!(out, "Slides: {}", summary.total_slides);
    out.push_str("\nTop Topics:\n");
    for topic in &summary.top_topics {
        let _ = writeln!(out, "  - {} ({} mentions)", topic.topic, topic.mentions);
    }
    let keywords: Vec<&str> = summary.keywords.iter().take(10).map(String::as_str).collect();
    let entities: Vec<&str> = summary.key_entities.iter().take(5).map(String::as_str).collect();
    let _ = writeln!(out, "\nKeywords: {}", keywords.join(", "));
    let _ = writeln!(out, "\nEntities: {}", entities.join(", "));
    out
}

pub fn render_related(filename: &str, related: &[RelatedPresentation]) -> String {
    let mut out = format!("=== Presentations Related to '{}' ===\n\n", filename);
    if related.is_empty() {
        out.push_str("  None found\n");
    }
    for r in related {
        let _ = writeln!(out, "  {} ({} shared topics)", r.title, r.shared_topics);
    }
    out
}

pub fn render_blog(topic: &str, material: Option<&BlogMaterial>) -> String {
    let mut out = format!("=== Blog Material: {} ===\n\n", topic);
    let Some(material) = material else {
        out.push_str("Topic not found\n");
        return out;
    };

    out.push_str("Presentations:\n");
    for p in &material.presentations {
        let _ = writeln!(out, "  - {}", p.title);
        if !p.keywords.is_empty() {
            let _ = writeln!(out, "    Keywords: {}", p.keywords.join(", "));
        }
    }
    let _ = writeln!(out, "\nRelated Topics: {}", material.related_topics.join(", "));
    let entities: Vec<String> = material
        .entities
        .iter()
        .map(|e| format!("{} ({})", e.name, e.kind))
        .collect();
    let _ = writeln!(out, "\nEntities: {}", entities.join(", "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_graph::query::{TopicCluster, TopicCount, Track};

    fn stat(topic: &str, mentions: u64, presentation_count: usize) -> TopicStat {
        TopicStat {
            topic: topic.into(),
            mentions,
            presentation_count,
        }
    }

    #[test]
    fn test_render_agenda() {
        let agenda = Agenda {
            keynote_topics: vec![stat("Kubernetes", 12, 3)],
            tracks: vec![Track {
                label: "Track 1: Kubernetes".into(),
                cluster: TopicCluster {
                    main_topic: "Kubernetes".into(),
                    related_topics: vec![
                        "Docker".into(),
                        "Helm".into(),
                        "Istio".into(),
                        "Envoy".into(),
                    ],
                    presentations: vec!["A".into(), "B".into()],
                    total_mentions: 12,
                },
            }],
            popular_topics: vec!["Kubernetes".into()],
        };

        let text = render_agenda(&agenda);
        assert!(text.contains("  - Kubernetes (3 presentations, 12 mentions)"));
        assert!(text
            .contains("Track 1: Kubernetes:\n  Related: Docker, Helm, Istio\n  Presentations: 2"));
        assert!(!text.contains("Envoy"));
    }

    #[test]
    fn test_render_topics() {
        let text = render_topics(&[stat("Docker", 4, 2)]);
        assert_eq!(text, "=== Top Topics ===\n\n  Docker: 4 mentions in 2 presentations\n");
    }

    #[test]
    fn test_render_summary_not_found() {
        assert!(render_summary(None).ends_with("Presentation not found\n"));
    }

    #[test]
    fn test_render_summary() {
        let summary = PresentationSummary {
            filename: "cloud.pdf".into(),
            title: "Cloud Native".into(),
            total_slides: 7,
            top_topics: vec![TopicCount {
                topic: "Kubernetes".into(),
                mentions: 5,
            }],
            key_entities: vec!["Google".into()],
            keywords: vec!["kubernetes".into(), "clusters".into()],
        };

        let text = render_summary(Some(&summary));
        assert!(text.contains("Title: Cloud Native\nSlides: 7\n"));
        assert!(text.contains("  - Kubernetes (5 mentions)"));
        assert!(text.contains("Keywords: kubernetes, clusters"));
    }

    #[test]
    fn test_render_search_empty() {
        assert!(render_search("quantum", &[]).contains("No matches"));
    }
}
