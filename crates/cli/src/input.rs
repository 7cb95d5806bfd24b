//! Input discovery and loading.

use anyhow::{Context, Result};
use deck_core::Presentation;
use deck_pptx::PptxExtractor;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Split artifacts such as `talk_part02.pdf`.
static SPLIT_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_part\d+\.[^.]+$").unwrap());

/// Supported input document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Extraction service export.
    Json,
    Pptx,
}

impl InputFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(InputFormat::Json),
            "pptx" => Some(InputFormat::Pptx),
            _ => None,
        }
    }
}

/// Extraction export: one presentation, or a batch of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtractionDocument {
    Batch { presentations: Vec<Presentation> },
    Single(Presentation),
}

pub fn is_split_part(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| SPLIT_PART.is_match(n))
        .unwrap_or(false)
}

/// Resolve the ingest input to a list of documents, in file name order.
///
/// A file is returned as-is. A directory yields its supported documents,
/// descending into subdirectories only when `recursive` is set.
pub fn collect_inputs(input: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        anyhow::bail!("{} is not a valid file or directory", input.display());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();
    for entry in WalkDir::new(input)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || InputFormat::from_path(path).is_none() {
            continue;
        }
        if is_split_part(path) {
            log::debug!("Skipping split file {}", path.display());
            continue;
        }
        found.push(path.to_path_buf());
    }

    log::info!("Found {} documents in {}", found.len(), input.display());
    Ok(found)
}

/// Load every presentation a document holds.
pub fn load_presentations(path: &Path, extractor: &PptxExtractor) -> Result<Vec<Presentation>> {
    let format = InputFormat::from_path(path)
        .ok_or_else(|| anyhow::anyhow!("Unsupported file format: {}", path.display()))?;

    match format {
        InputFormat::Json => {
            log::debug!("Reading extraction export");
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let document: ExtractionDocument =
                serde_json::from_reader(std::io::BufReader::new(file))
                    .with_context(|| format!("Invalid extraction export {}", path.display()))?;
            Ok(match document {
                ExtractionDocument::Batch { presentations } => presentations,
                ExtractionDocument::Single(presentation) => vec![presentation],
            })
        }
        InputFormat::Pptx => {
            log::debug!("Parsing as PPTX");
            let presentation = extractor
                .extract_file(path)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            Ok(vec![presentation])
        }
    }
}

/// Determine the export path for a presentation.
///
/// Paths already in `taken` get a `-2`, `-3`, ... suffix, so decks that
/// share a stem across directories do not overwrite each other.
pub fn get_output_path(
    filename: &str,
    output_dir: &Path,
    taken: &mut HashSet<PathBuf>,
) -> Result<PathBuf> {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    let mut path = output_dir.join(format!("{}.json", stem));
    let mut suffix = 1;
    while taken.contains(&path) {
        suffix += 1;
        path = output_dir.join(format!("{}-{}.json", stem, suffix));
    }
    if suffix > 1 {
        log::warn!(
            "Export name {}.json is already used in this run, writing {} instead",
            stem,
            path.display()
        );
    }

    taken.insert(path.clone());
    Ok(path)
}

/// Write output to a file.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::TextNormalizer;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_split_part_detection() {
        assert!(is_split_part(Path::new("talk_part01.pdf")));
        assert!(is_split_part(Path::new("dir/talk_PART12.json")));
        assert!(!is_split_part(Path::new("talk_party.json")));
        assert!(!is_split_part(Path::new("talk.pptx")));
    }

    #[test]
    fn test_collect_inputs_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.pptx");
        touch(tmp.path(), "a.json");
        touch(tmp.path(), "a_part01.json");
        touch(tmp.path(), "notes.txt");
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        touch(&tmp.path().join("nested"), "c.pptx");

        let flat = collect_inputs(tmp.path(), false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.pptx"]);

        let deep = collect_inputs(tmp.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        assert!(collect_inputs(Path::new("/nonexistent/decks"), false).is_err());
    }

    #[test]
    fn test_load_single_and_batch_exports() {
        let tmp = TempDir::new().unwrap();
        let presentation = Presentation::from_pages(
            Path::new("cloud.pdf"),
            ["Cloud Native Patterns", "Kubernetes"],
            BTreeMap::new(),
            &TextNormalizer::new(),
        );

        let single = tmp.path().join("single.json");
        std::fs::write(&single, serde_json::to_string(&presentation).unwrap()).unwrap();
        let batch = tmp.path().join("batch.json");
        let body = serde_json::json!({ "presentations": [presentation, presentation] });
        std::fs::write(&batch, body.to_string()).unwrap();

        let extractor = PptxExtractor::new();
        let loaded = load_presentations(&single, &extractor).unwrap();
        assert_eq!(loaded, vec![presentation.clone()]);
        assert_eq!(load_presentations(&batch, &extractor).unwrap().len(), 2);
    }

    #[test]
    fn test_load_rejects_bad_documents() {
        let tmp = TempDir::new().unwrap();
        let broken = tmp.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let fake = tmp.path().join("fake.pptx");
        std::fs::write(&fake, "not a zip").unwrap();

        let extractor = PptxExtractor::new();
        assert!(load_presentations(&broken, &extractor).is_err());
        assert!(load_presentations(&fake, &extractor).is_err());
        assert!(load_presentations(Path::new("deck.key"), &extractor).is_err());
    }

    #[test]
    fn test_output_path_uses_stem() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("exports");
        let mut taken = HashSet::new();
        let path = get_output_path("Cloud Talk.pdf", &out, &mut taken).unwrap();
        assert_eq!(path, out.join("Cloud Talk.json"));
        assert!(out.is_dir());
    }

    #[test]
    fn test_output_path_disambiguates_shared_stems() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("exports");
        let mut taken = HashSet::new();

        let paths: Vec<PathBuf> = ["talk.pdf", "talk.pptx", "talk.json"]
            .iter()
            .map(|f| get_output_path(f, &out, &mut taken).unwrap())
            .collect();
        assert_eq!(
            paths,
            vec![
                out.join("talk.json"),
                out.join("talk-2.json"),
                out.join("talk-3.json")
            ]
        );
    }
}
