//! DOCX picture extractor implementation.

use purification_core::extract::write_scratch_image;
use purification_core::{Error, ExtractedImage, ImageExtractor, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Label of the cell whose right neighbour holds the sample name.
pub const SAMPLE_NAME_LABEL: &str = "Sample name:";

/// Only the top-left block of each table is searched for the label.
const LABEL_SCAN_SIZE: usize = 5;

/// Each sample contributes two inline pictures; the second is kept.
const PICTURES_PER_SAMPLE: usize = 2;

const DOCUMENT_PATH: &str = "word/document.xml";
const DOCUMENT_RELS_PATH: &str = "word/_rels/document.xml.rels";

/// Text of a top-level table: rows of cell texts.
type TableCells = Vec<Vec<String>>;

/// What the extractor needs from `word/document.xml`.
#[derive(Debug, Default)]
struct DocumentLayout {
    tables: Vec<TableCells>,
    /// Relationship ids of inline pictures, in document order.
    inline_pictures: Vec<String>,
}

/// Extractor for Word chromatography reports.
pub struct DocxExtractor;

impl DocxExtractor {
    /// Create a new DOCX extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract sample pictures from a DOCX package.
    pub fn extract_from_reader<R: Read + Seek>(
        &self,
        reader: R,
        scratch_dir: &Path,
    ) -> Result<Vec<ExtractedImage>> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let document = String::from_utf8_lossy(&self.read_file_from_archive(&mut archive, DOCUMENT_PATH)?)
            .into_owned();
        let rels = String::from_utf8_lossy(&self.read_file_from_archive(&mut archive, DOCUMENT_RELS_PATH)?)
            .into_owned();

        let layout = self.parse_document(&document)?;
        let targets = self.parse_relationships(&rels)?;

        let mut images = Vec::new();
        for (index, table) in layout.tables.iter().enumerate() {
            let Some(name) = sample_name(table) else {
                log::warn!("Table {} has no '{}' cell; skipping", index + 1, SAMPLE_NAME_LABEL);
                continue;
            };

            let picture = index * PICTURES_PER_SAMPLE + 1;
            let rel_id = layout.inline_pictures.get(picture).ok_or_else(|| {
                Error::Format(format!(
                    "Sample '{}' has no picture (expected inline picture {}, found {})",
                    name,
                    picture + 1,
                    layout.inline_pictures.len()
                ))
            })?;
            let target = targets.get(rel_id).ok_or_else(|| {
                Error::Format(format!("Picture relationship '{}' is not defined", rel_id))
            })?;

            let bytes = self.read_file_from_archive(&mut archive, target)?;
            let image = write_scratch_image(scratch_dir, &name, "bin", &bytes)?;
            log::debug!("Extracted '{}' from {} to '{}'", name, target, image.path.display());
            images.push(image);
        }

        Ok(images)
    }

    /// Collect top-level table cell texts and inline picture references.
    fn parse_document(&self, xml_content: &str) -> Result<DocumentLayout> {
        let mut layout = DocumentLayout::default();
        let mut reader = Reader::from_str(xml_content);

        let mut table_depth = 0usize;
        let mut table: TableCells = Vec::new();
        let mut cell = String::new();
        let mut cell_paragraphs = 0usize;
        let mut in_text = false;
        let mut in_inline = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"tbl" => {
                            table_depth += 1;
                            if table_depth == 1 {
                                table = Vec::new();
                            }
                        }
                        b"tr" if table_depth == 1 => table.push(Vec::new()),
                        b"tc" if table_depth == 1 => {
                            cell.clear();
                            cell_paragraphs = 0;
                        }
                        b"p" if table_depth == 1 => {
                            if cell_paragraphs > 0 {
                                cell.push('\n');
                            }
                            cell_paragraphs += 1;
                        }
                        b"t" => in_text = true,
                        b"inline" => in_inline = true,
                        b"blip" if in_inline => push_embed(&mut layout, e),
                        _ => {}
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"p" if table_depth == 1 => {
                            if cell_paragraphs > 0 {
                                cell.push('\n');
                            }
                            cell_paragraphs += 1;
                        }
                        b"blip" if in_inline => push_embed(&mut layout, e),
                        _ => {}
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if in_text && table_depth == 1 {
                        let text = e.unescape().unwrap_or_default();
                        cell.push_str(&text);
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"t" => in_text = false,
                        b"inline" => in_inline = false,
                        b"tc" if table_depth == 1 => {
                            if let Some(row) = table.last_mut() {
                                row.push(std::mem::take(&mut cell));
                            }
                        }
                        b"tbl" => {
                            if table_depth == 1 {
                                layout.tables.push(std::mem::take(&mut table));
                            }
                            table_depth = table_depth.saturating_sub(1);
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing {}: {}", DOCUMENT_PATH, e)));
                }
                _ => {}
            }
        }

        log::debug!(
            "Document has {} tables and {} inline pictures",
            layout.tables.len(),
            layout.inline_pictures.len()
        );
        Ok(layout)
    }

    /// Map relationship ids to archive paths.
    fn parse_relationships(&self, xml_content: &str) -> Result<HashMap<String, String>> {
        let mut targets = HashMap::new();
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                    let mut id = String::new();
                    let mut target = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }
                    let full_path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("word/{}", target),
                    };
                    targets.insert(id, full_path);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(targets)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageExtractor for DocxExtractor {
    fn extract(&self, path: &Path, scratch_dir: &Path) -> Result<Vec<ExtractedImage>> {
        let file = File::open(path)?;
        let images = self.extract_from_reader(BufReader::new(file), scratch_dir)?;
        log::info!("Extracted {} pictures from '{}'", images.len(), path.display());
        Ok(images)
    }
}

/// Find the sample name in the top-left block of a table.
///
/// The name is the text of the cell right of the `Sample name:` label. When
/// the label occurs more than once, the last occurrence wins.
fn sample_name(table: &TableCells) -> Option<String> {
    let mut found = None;
    for row in table.iter().take(LABEL_SCAN_SIZE) {
        for (col, text) in row.iter().enumerate().take(LABEL_SCAN_SIZE) {
            if text.trim() == SAMPLE_NAME_LABEL {
                if let Some(name) = row.get(col + 1) {
                    found = Some(name.trim().to_string());
                }
            }
        }
    }
    found
}

fn push_embed(layout: &mut DocumentLayout, e: &BytesStart) {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"embed" {
            layout
                .inline_pictures
                .push(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
