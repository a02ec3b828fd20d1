//! PPTX outline reader.

use crate::outline::{Outline, SlideOutline};
use purification_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Reads the text of a PPTX file back, slide by slide.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open and parse a PPTX file.
    pub fn open(&self, path: &Path) -> Result<Outline> {
        let file = File::open(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.parse(BufReader::new(file), &filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Outline> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut outline = Outline::new(filename);

        // Get the slide order from presentation.xml.rels
        let slide_order = self.get_slide_order(&mut archive)?;

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            outline.add_slide(slide);
        }

        log::debug!("Read {} slides from '{}'", outline.slide_count(), filename);
        Ok(outline)
    }

    /// Get the ordered list of slide paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_path = "ppt/_rels/presentation.xml.rels";

        let rels_content = self.read_file_from_archive(archive, rels_path)?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => {
                                rel_type = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Target" => {
                                target = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Id" => {
                                id = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            _ => {}
                        }
                    }

                    if rel_type.ends_with("/slide") {
                        let order_num = extract_slide_number(&id).or_else(|| extract_slide_number(&target));
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slides.push((full_path, order_num));
                    }
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

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<SlideOutline> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let mut slide = SlideOutline::new(slide_number);

        for shape in self.extract_shapes_from_xml(&content)? {
            if !shape.text.trim().is_empty() {
                slide.add_line_with_position(&shape.text, shape.y, shape.x);
            }
        }

        slide.sort_by_position();
        Ok(slide)
    }

    /// Extract shapes and tables with their text and position from slide XML.
    ///
    /// Table cells are joined with `" | "` and rows with newlines; cells
    /// covered by a horizontal merge are skipped.
    fn extract_shapes_from_xml(&self, xml_content: &str) -> Result<Vec<ShapeInfo>> {
        let mut shapes = Vec::new();
        let mut reader = Reader::from_str(xml_content);

        let mut current_shape: Option<ShapeInfo> = None;
        let mut in_text = false;
        let mut paragraph_count = 0usize;
        let mut current_text = String::new();

        let mut table = TableText::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"sp" | b"pic" | b"graphicFrame" if current_shape.is_none() => {
                            current_shape = Some(ShapeInfo::default());
                            paragraph_count = 0;
                            table = TableText::default();
                        }
                        b"tr" => table.rows.push(Vec::new()),
                        b"tc" => {
                            table.skip_cell = is_merged_cell(e);
                            table.cell.clear();
                            paragraph_count = 0;
                        }
                        b"p" => {
                            if paragraph_count > 0 {
                                let separator = if table.rows.is_empty() { '\n' } else { ' ' };
                                target_text(&mut table, &mut current_text).push(separator);
                            }
                            paragraph_count += 1;
                        }
                        b"t" => in_text = true,
                        b"off" => set_offset(&mut current_shape, e),
                        _ => {}
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"off" => set_offset(&mut current_shape, e),
                        b"tc" => {
                            if let Some(row) = table.rows.last_mut() {
                                if !is_merged_cell(e) {
                                    row.push(String::new());
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if in_text {
                        let text = e.unescape().unwrap_or_default();
                        target_text(&mut table, &mut current_text).push_str(&text);
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"t" => in_text = false,
                        b"tc" => {
                            if !table.skip_cell {
                                let cell = table.cell.trim().to_string();
                                if let Some(row) = table.rows.last_mut() {
                                    row.push(cell);
                                }
                            }
                            table.cell.clear();
                            table.skip_cell = false;
                        }
                        b"sp" | b"pic" | b"graphicFrame" => {
                            if let Some(mut shape) = current_shape.take() {
                                shape.text = if table.rows.is_empty() {
                                    current_text.trim().to_string()
                                } else {
                                    table.render()
                                };
                                if !shape.text.is_empty() {
                                    shapes.push(shape);
                                }
                            }
                            current_text.clear();
                            table = TableText::default();
                            in_text = false;
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::warn!("XML parsing error (continuing): {}", e);
                }
                _ => {}
            }
        }

        Ok(shapes)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
    has_offset: bool,
}

/// Table text collected while walking a graphic frame.
#[derive(Debug, Default)]
struct TableText {
    rows: Vec<Vec<String>>,
    cell: String,
    skip_cell: bool,
}

impl TableText {
    fn render(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join(" | "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Text buffer the next run belongs to: the open cell or the shape.
fn target_text<'a>(table: &'a mut TableText, shape_text: &'a mut String) -> &'a mut String {
    if table.rows.is_empty() {
        shape_text
    } else {
        &mut table.cell
    }
}

fn is_merged_cell(e: &BytesStart) -> bool {
    e.attributes()
        .flatten()
        .any(|a| matches!(a.key.as_ref(), b"hMerge" | b"vMerge") && a.value.as_ref() == b"1")
}

/// Record the first offset seen inside the current shape.
fn set_offset(shape: &mut Option<ShapeInfo>, e: &BytesStart) {
    let Some(shape) = shape.as_mut() else {
        return;
    };
    if shape.has_offset {
        return;
    }
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"x" => {
                if let Ok(x) = String::from_utf8_lossy(&attr.value).parse::<f64>() {
                    shape.x = x;
                }
            }
            b"y" => {
                if let Ok(y) = String::from_utf8_lossy(&attr.value).parse::<f64>() {
                    shape.y = y;
                }
            }
            _ => {}
        }
    }
    shape.has_offset = true;
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{Deck, Layout, TextFrame};
    use crate::units::Rect;
    use crate::writer::PptxWriter;
    use std::io::Cursor;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_shape_text_keeps_run_spacing() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
            <p:sp><p:spPr><a:xfrm><a:off x="10" y="20"/></a:xfrm></p:spPr>
            <p:txBody><a:p><a:r><a:t>Characterization</a:t></a:r></a:p>
            <a:p><a:r><a:t>Final </a:t></a:r><a:r><a:t>- Protein Purification Summary</a:t></a:r></a:p></p:txBody></p:sp>
            </p:spTree></p:cSld></p:sld>"#;
        let shapes = PptxParser::new().extract_shapes_from_xml(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(
            shapes[0].text,
            "Characterization\nFinal - Protein Purification Summary"
        );
        assert_eq!(shapes[0].y, 20.0);
    }

    #[test]
    fn test_table_text_skips_merged_cells() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:graphicFrame><p:xfrm><a:off x="5" y="6"/></p:xfrm>
            <a:graphic><a:graphicData><a:tbl>
            <a:tr h="1"><a:tc><a:txBody><a:p><a:r><a:t>Lane</a:t></a:r></a:p></a:txBody></a:tc>
            <a:tc><a:txBody><a:p><a:r><a:t>Protein name</a:t></a:r></a:p></a:txBody></a:tc>
            <a:tc><a:txBody><a:p><a:r><a:t>MW(kDa)</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
            <a:tr h="1"><a:tc><a:txBody><a:p><a:r><a:t>M</a:t></a:r></a:p></a:txBody></a:tc>
            <a:tc gridSpan="2"><a:txBody><a:p><a:r><a:t>Ladder</a:t></a:r></a:p></a:txBody></a:tc>
            <a:tc hMerge="1"><a:txBody><a:p/></a:txBody></a:tc></a:tr>
            </a:tbl></a:graphicData></a:graphic></p:graphicFrame></p:sld>"#;
        let shapes = PptxParser::new().extract_shapes_from_xml(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].text, "Lane | Protein name | MW(kDa)\nM | Ladder");
        assert_eq!(shapes[0].x, 5.0);
    }

    #[test]
    fn test_round_trip_slide_order() {
        let mut deck = Deck::new();
        for n in 1..=12 {
            let slide = deck.new_slide(Layout::Summary);
            slide.set_title(TextFrame::from_text(format!("Slide {}", n)));
            let table = slide.add_table(2, 2, Rect::cm(1.0, 4.0, 10.0, 2.0));
            table.set_text(0, 0, "No");
            table.set_text(1, 0, n.to_string());
        }
        let mut buffer = Cursor::new(Vec::new());
        PptxWriter::new().write(&deck, &mut buffer).unwrap();
        buffer.set_position(0);

        let outline = PptxParser::new().parse(buffer, "deck.pptx").unwrap();
        assert_eq!(outline.slide_count(), 12);
        for (index, slide) in outline.slides.iter().enumerate() {
            assert_eq!(slide.number, index + 1);
            assert!(slide.contains(&format!("Slide {}", index + 1)));
            assert!(slide.contains(&format!("No | \n{} | ", index + 1)));
        }
    }
}
