//! PPTX text extraction.

use deck_core::{Error, Presentation, Result, TextNormalizer};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const CORE_PROPERTIES: &str = "docProps/core.xml";

/// Extracts slide text from PPTX archives.
#[derive(Debug, Clone, Default)]
pub struct PptxExtractor {
    normalizer: TextNormalizer,
}

impl PptxExtractor {
    /// Create a new PPTX extractor.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Open and extract a file on disk.
    pub fn extract_file(&self, path: &Path) -> Result<Presentation> {
        let file = File::open(path)?;
        self.extract(BufReader::new(file), path)
    }

    /// Extract a presentation from a reader. `path` supplies the filename.
    pub fn extract<R: Read + Seek>(&self, reader: R, path: &Path) -> Result<Presentation> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = slide_order(&mut archive)?;
        let mut pages = Vec::with_capacity(slide_paths.len());
        for slide_path in &slide_paths {
            let xml = read_entry(&mut archive, slide_path)?;
            pages.push(slide_text(&xml)?);
        }

        let metadata = match read_entry(&mut archive, CORE_PROPERTIES) {
            Ok(xml) => core_properties(&xml),
            Err(e) => {
                log::debug!("No document properties in {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        log::debug!("Extracted {} slides from {}", pages.len(), path.display());
        Ok(Presentation::from_pages(path, pages, metadata, &self.normalizer))
    }
}

/// Ordered slide part paths, from the presentation relationships.
fn slide_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    let rels = read_entry(archive, PRESENTATION_RELS)?;
    let mut slides: Vec<(String, Option<usize>)> = Vec::new();

    let mut reader = Reader::from_str(&rels);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let rel_type = attribute(e, b"Type").unwrap_or_default();
                let target = attribute(e, b"Target").unwrap_or_default();
                let id = attribute(e, b"Id").unwrap_or_default();

                if rel_type.ends_with("/slide") {
                    let order = extract_slide_number(&target).or_else(|| extract_slide_number(&id));
                    let full_path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("ppt/{}", target),
                    };
                    slides.push((full_path, order));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

/// Text frame of one shape.
#[derive(Debug, Default)]
struct ShapeText {
    x: f64,
    y: f64,
    text: String,
}

/// Slide text in reading order: shapes top-to-bottom then left-to-right,
/// one line per paragraph.
fn slide_text(xml: &str) -> Result<String> {
    let mut shapes: Vec<ShapeText> = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut current: Option<ShapeText> = None;
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current = Some(ShapeText::default()),
                b"off" => set_offset(current.as_mut(), e),
                b"t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"off" => set_offset(current.as_mut(), e),
                b"br" => {
                    if let Some(shape) = current.as_mut() {
                        shape.text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text_run => {
                if let Some(shape) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::XmlError(format!("Bad text run: {}", err)))?;
                    shape.text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text_run = false,
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        shape.text.push('\n');
                    }
                }
                b"sp" => {
                    if let Some(shape) = current.take() {
                        if !shape.text.trim().is_empty() {
                            shapes.push(shape);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error in slide (continuing): {}", e);
            }
            _ => {}
        }
    }

    shapes.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let lines: Vec<&str> = shapes
        .iter()
        .flat_map(|s| s.text.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    Ok(lines.join("\n"))
}

fn set_offset(shape: Option<&mut ShapeText>, e: &BytesStart<'_>) {
    let Some(shape) = shape else {
        return;
    };
    if let Some(x) = attribute(e, b"x").and_then(|v| v.parse().ok()) {
        shape.x = x;
    }
    if let Some(y) = attribute(e, b"y").and_then(|v| v.parse().ok()) {
        shape.y = y;
    }
}

/// Document properties under the key names PDF metadata uses.
fn core_properties(xml: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut current_key: Option<&'static str> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                current_key = match local_name(e.name().as_ref()) {
                    b"title" => Some("Title"),
                    b"creator" => Some("Author"),
                    b"subject" => Some("Subject"),
                    b"keywords" => Some("Keywords"),
                    b"created" => Some("CreationDate"),
                    b"modified" => Some("ModDate"),
                    _ => None,
                };
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(key), Ok(value)) = (current_key, e.unescape()) {
                    if !value.trim().is_empty() {
                        metadata.insert(key.to_string(), value.trim().to_string());
                    }
                }
            }
            Ok(Event::End(_)) => current_key = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("Ignoring malformed document properties: {}", e);
                break;
            }
            _ => {}
        }
    }

    metadata
}

/// Read a file from the ZIP archive.
fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");
    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    s[start..].parse().ok()
}
