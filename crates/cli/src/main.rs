//! CLI for building and querying a knowledge graph of slide decks.

mod input;
mod report;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use deck_graph::{
    DuplicatePolicy, GraphBuilder, IngestOptions, LoadOutcome, MemoryGraph, QueryAggregator,
    RelationshipDeriver,
};
use deck_pptx::PptxExtractor;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use input::{collect_inputs, get_output_path, load_presentations, write_output};

/// Build and query a knowledge graph of conference presentations.
#[derive(Parser, Debug)]
#[command(name = "deckgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract presentations and load them into the graph
    Ingest(IngestArgs),
    /// Run a query against the graph
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Graph snapshot file
    #[arg(long, env = "DECKGRAPH_STORE", default_value = "deckgraph.json")]
    store: PathBuf,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Extraction export (.json), PowerPoint file (.pptx) or directory
    input: PathBuf,

    /// Process subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Also write each extracted presentation as JSON into this directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    store: StoreArgs,

    /// Clear the graph before loading
    #[arg(long)]
    clear: bool,

    /// What to do with presentations that are already loaded
    #[arg(long, value_enum, default_value_t = OnDuplicate::Reject)]
    on_duplicate: OnDuplicate,

    /// Topics linked per slide
    #[arg(long, default_value = "5")]
    topics_per_slide: usize,

    /// Keywords linked per slide
    #[arg(long, default_value = "10")]
    keywords_per_slide: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[arg(long, value_enum)]
    action: Action,

    /// Search text, presentation filename or topic, depending on the action
    #[arg(short, long)]
    query: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    limit: usize,

    #[command(flatten)]
    store: StoreArgs,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OnDuplicate {
    Reject,
    Skip,
    Replace,
}

impl From<OnDuplicate> for DuplicatePolicy {
    fn from(value: OnDuplicate) -> Self {
        match value {
            OnDuplicate::Reject => DuplicatePolicy::Reject,
            OnDuplicate::Skip => DuplicatePolicy::Skip,
            OnDuplicate::Replace => DuplicatePolicy::Replace,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
    Agenda,
    Topics,
    Search,
    Summary,
    Related,
    Blog,
}

impl Action {
    fn needs_query(self) -> bool {
        matches!(
            self,
            Action::Search | Action::Summary | Action::Related | Action::Blog
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Command::Ingest(args) => args.verbose,
        Command::Query(args) => args.verbose,
    };

    // Initialize logging
    if verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match &cli.command {
        Command::Ingest(args) => run_ingest(args).map(|counts| counts.failed == 0),
        Command::Query(args) => run_query(args).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Ingest documents and report how each one went.
fn run_ingest(args: &IngestArgs) -> Result<IngestCounts> {
    let inputs = collect_inputs(&args.input, args.recursive)?;

    let graph = MemoryGraph::open(&args.store.store)
        .with_context(|| format!("Failed to open graph store {}", args.store.store.display()))?;
    let options = IngestOptions::new()
        .with_topics_per_slide(args.topics_per_slide)
        .with_keywords_per_slide(args.keywords_per_slide)
        .with_duplicate_policy(args.on_duplicate.into());
    let builder = GraphBuilder::with_options(&graph, options);

    if args.clear {
        builder.clear()?;
        log::info!("Cleared graph store");
    }

    let extractor = PptxExtractor::new();
    let mut counts = IngestCounts::default();
    let mut presentations = Vec::new();

    for path in &inputs {
        log::info!("Processing: {}", path.display());
        match load_presentations(path, &extractor) {
            Ok(found) => {
                log::debug!("  Found {} presentations", found.len());
                presentations.extend(found);
            }
            Err(e) => {
                counts.failed += 1;
                eprintln!("Error processing {}: {:#}", path.display(), e);
            }
        }
    }

    if let Some(dir) = &args.output {
        let mut taken = HashSet::new();
        for presentation in &presentations {
            let output_path = get_output_path(&presentation.filename, dir, &mut taken)?;
            write_output(&output_path, &serde_json::to_string_pretty(presentation)?)?;
            log::info!("Written to: {}", output_path.display());
        }
    }

    println!("\nLoading {} presentations into graph...", presentations.len());
    for presentation in &presentations {
        match builder.load_presentation(presentation) {
            Ok(LoadOutcome::Loaded(report)) | Ok(LoadOutcome::Replaced(report)) => {
                counts.loaded += 1;
                println!(
                    "  Loaded {} ({} slides, {} topics)",
                    report.filename, report.slides, report.covered_topics
                );
            }
            Ok(LoadOutcome::Skipped) => {
                counts.skipped += 1;
                println!("  Skipped {} (already loaded)", presentation.filename);
            }
            Err(e) => {
                counts.failed += 1;
                eprintln!("Error loading {}: {}", presentation.filename, e);
            }
        }
    }

    RelationshipDeriver::new(&graph).derive_topic_cooccurrence()?;
    graph
        .save()
        .with_context(|| format!("Failed to save graph store {}", args.store.store.display()))?;

    let stats = builder.statistics()?;
    println!("\n{}", "=".repeat(60));
    println!("Graph Statistics:");
    println!("{}", stats);
    println!("{}", "=".repeat(60));
    println!("{}", counts);

    Ok(counts)
}

/// Per-run document outcomes.
#[derive(Debug, Default, PartialEq, Eq)]
struct IngestCounts {
    loaded: usize,
    skipped: usize,
    failed: usize,
}

impl fmt::Display for IngestCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loaded: {}, Skipped: {}, Failed: {}",
            self.loaded, self.skipped, self.failed
        )
    }
}

fn run_query(args: &QueryArgs) -> Result<()> {
    let query = match (&args.query, args.action.needs_query()) {
        (Some(q), _) => q.as_str(),
        (None, false) => "",
        (None, true) => anyhow::bail!("--query is required for --action {:?}", args.action),
    };

    let graph = open_store(&args.store.store)?;
    let tools = QueryAggregator::new(&graph);

    match args.action {
        Action::Agenda => {
            let agenda = tools.generate_agenda()?;
            emit(args.json, &agenda, || report::render_agenda(&agenda))
        }
        Action::Topics => {
            let topics = tools.top_topics(args.limit)?;
            emit(args.json, &topics, || report::render_topics(&topics))
        }
        Action::Search => {
            let mut hits = tools.search_presentations(query)?;
            hits.truncate(args.limit);
            emit(args.json, &hits, || report::render_search(query, &hits))
        }
        Action::Summary => {
            let summary = tools.presentation_summary(query)?;
            emit(args.json, &summary, || report::render_summary(summary.as_ref()))
        }
        Action::Related => {
            let related = tools.related_presentations(query, args.limit)?;
            emit(args.json, &related, || report::render_related(query, &related))
        }
        Action::Blog => {
            let material = tools.blog_post_material(query)?;
            emit(args.json, &material, || report::render_blog(query, material.as_ref()))
        }
    }
}

fn open_store(path: &Path) -> Result<MemoryGraph> {
    if !path.exists() {
        log::warn!("Graph store {} does not exist; querying an empty graph", path.display());
    }
    MemoryGraph::open(path)
        .with_context(|| format!("Failed to open graph store {}", path.display()))
}

fn emit<T: Serialize>(json: bool, value: &T, render: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", render());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest_defaults() {
        let cli = Cli::try_parse_from(["deckgraph", "ingest", "decks/", "-r"]).unwrap();
        let Command::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert!(args.recursive);
        assert_eq!(args.on_duplicate, OnDuplicate::Reject);
        assert_eq!(args.topics_per_slide, 5);
        assert_eq!(args.keywords_per_slide, 10);
    }

    #[test]
    fn test_parse_rejects_bad_limit() {
        let parsed =
            Cli::try_parse_from(["deckgraph", "query", "--action", "topics", "--limit", "many"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_query_required_before_store_access() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = tmp.path().join("graph.json");
        let args = QueryArgs {
            action: Action::Summary,
            query: None,
            limit: 20,
            store: StoreArgs { store: store.clone() },
            json: false,
            verbose: false,
        };

        assert!(run_query(&args).is_err());
        assert!(!store.exists());
    }

    #[test]
    fn test_ingest_export_and_query() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = tmp.path().join("graph.json");
        let presentation = deck_core::Presentation::from_pages(
            Path::new("containers.pdf"),
            ["Kubernetes and Docker", "Kubernetes with Docker again"],
            Default::default(),
            &deck_core::TextNormalizer::new(),
        );
        let export = tmp.path().join("containers.json");
        std::fs::write(&export, serde_json::to_string(&presentation).unwrap()).unwrap();

        let args = IngestArgs {
            input: export,
            recursive: false,
            output: Some(tmp.path().join("out")),
            store: StoreArgs { store: store.clone() },
            clear: false,
            on_duplicate: OnDuplicate::Skip,
            topics_per_slide: 5,
            keywords_per_slide: 10,
            verbose: false,
        };
        let first = run_ingest(&args).unwrap();
        assert_eq!((first.loaded, first.skipped, first.failed), (1, 0, 0));
        let second = run_ingest(&args).unwrap();
        assert_eq!((second.loaded, second.skipped, second.failed), (0, 1, 0));
        assert!(tmp.path().join("out").join("containers.json").is_file());

        let graph = MemoryGraph::open_existing(&store).unwrap();
        let summary = QueryAggregator::new(&graph)
            .presentation_summary("containers.pdf")
            .unwrap()
            .unwrap();
        assert_eq!(summary.total_slides, 2);
    }

    fn ingest_args(input: PathBuf, store: PathBuf, output: Option<PathBuf>) -> IngestArgs {
        IngestArgs {
            input,
            recursive: false,
            output,
            store: StoreArgs { store },
            clear: false,
            on_duplicate: OnDuplicate::Reject,
            topics_per_slide: 5,
            keywords_per_slide: 10,
            verbose: false,
        }
    }

    #[test]
    fn test_broken_document_fails_run_but_others_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let decks = tmp.path().join("decks");
        std::fs::create_dir(&decks).unwrap();
        let presentation = deck_core::Presentation::from_pages(
            Path::new("good.pdf"),
            ["Kubernetes and Docker"],
            Default::default(),
            &deck_core::TextNormalizer::new(),
        );
        std::fs::write(
            decks.join("good.json"),
            serde_json::to_string(&presentation).unwrap(),
        )
        .unwrap();
        std::fs::write(decks.join("broken.json"), "{ not json").unwrap();

        let store = tmp.path().join("graph.json");
        let counts = run_ingest(&ingest_args(decks, store.clone(), None)).unwrap();
        assert_eq!(
            counts,
            IngestCounts {
                loaded: 1,
                skipped: 0,
                failed: 1
            }
        );

        let graph = MemoryGraph::open_existing(&store).unwrap();
        let all = QueryAggregator::new(&graph).all_presentations().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].filename, "good.pdf");
    }

    #[test]
    fn test_corrupt_store_is_fatal_before_writes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let presentation = deck_core::Presentation::from_pages(
            Path::new("talk.pdf"),
            ["Kubernetes"],
            Default::default(),
            &deck_core::TextNormalizer::new(),
        );
        let export = tmp.path().join("talk.json");
        std::fs::write(&export, serde_json::to_string(&presentation).unwrap()).unwrap();
        let store = tmp.path().join("graph.json");
        std::fs::write(&store, "{corrupt").unwrap();
        let out = tmp.path().join("out");

        assert!(run_ingest(&ingest_args(export, store.clone(), Some(out.clone()))).is_err());
        assert!(!out.exists());
        assert_eq!(std::fs::read_to_string(&store).unwrap(), "{corrupt");
    }

    #[test]
    fn test_ingest_counts_display() {
        let counts = IngestCounts {
            loaded: 2,
            skipped: 1,
            failed: 0,
        };
        assert_eq!(counts.to_string(), "Loaded: 2, Skipped: 1, Failed: 0");
    }
}
