//! PDF picture extractor implementation.
//!
//! Two passes over the document:
//! 1. Text blocks (`BT` … `ET`) of every page, in page order. Each sample
//!    occupies [`TEXT_BLOCKS_PER_SAMPLE`] blocks and its name is the first
//!    line of block [`NAME_BLOCK_OFFSET`] of that run.
//! 2. Image streams in object-number order. Every picture is stored
//!    [`RENDERINGS_PER_PICTURE`] times and the last rendering is kept.
//!
//! Both offsets depend on the instrument software's export layout.

use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, Stream};
use purification_core::extract::write_scratch_image;
use purification_core::{Error, ExtractedImage, ImageExtractor, Result};
use std::io::Cursor;
use std::path::Path;

/// Text blocks emitted per sample in the instrument report.
pub const TEXT_BLOCKS_PER_SAMPLE: usize = 18;

/// Position of the sample-name block within a sample's text blocks.
pub const NAME_BLOCK_OFFSET: usize = 2;

/// Image objects stored per logical picture.
pub const RENDERINGS_PER_PICTURE: usize = 2;

/// Extractor for PDF chromatography reports.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract sample pictures from a loaded document.
    pub fn extract_from_document(
        &self,
        doc: &Document,
        scratch_dir: &Path,
    ) -> Result<Vec<ExtractedImage>> {
        let names = sample_names(&text_blocks(doc)?);
        log::debug!("Found {} sample names", names.len());

        let mut images = Vec::new();
        let mut order = 0usize;
        for (id, object) in &doc.objects {
            let Object::Stream(stream) = object else {
                continue;
            };
            if !is_image(&stream.dict) {
                continue;
            }

            order += 1;
            if order % RENDERINGS_PER_PICTURE != 0 {
                continue;
            }

            let index = order / RENDERINGS_PER_PICTURE - 1;
            let name = names.get(index).ok_or_else(|| {
                Error::Format(format!(
                    "Picture {} (object {} {}) has no sample name; only {} names found",
                    index + 1,
                    id.0,
                    id.1,
                    names.len()
                ))
            })?;

            let png = encode_png(decode_image(doc, stream)?)?;
            let image = write_scratch_image(scratch_dir, name, "png", &png)?;
            log::debug!("Extracted '{}' from object {} to '{}'", name, id.0, image.path.display());
            images.push(image);
        }

        Ok(images)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageExtractor for PdfExtractor {
    fn extract(&self, path: &Path, scratch_dir: &Path) -> Result<Vec<ExtractedImage>> {
        let doc = Document::load(path)
            .map_err(|e| Error::Pdf(format!("Failed to open '{}': {}", path.display(), e)))?;
        let images = self.extract_from_document(&doc, scratch_dir)?;
        if images.is_empty() {
            log::warn!("No pictures found in '{}'", path.display());
        } else {
            log::info!("Extracted {} pictures from '{}'", images.len(), path.display());
        }
        Ok(images)
    }
}

/// Text of every `BT` … `ET` block, page by page.
///
/// Line-moving operators start a new line within the block.
fn text_blocks(doc: &Document) -> Result<Vec<String>> {
    let mut blocks = Vec::new();

    for (page_no, page_id) in doc.get_pages() {
        let bytes = doc
            .get_page_content(page_id)
            .map_err(|e| Error::Pdf(format!("Failed to read page {}: {}", page_no, e)))?;
        let content = Content::decode(&bytes)
            .map_err(|e| Error::Pdf(format!("Failed to decode page {}: {}", page_no, e)))?;

        let mut current: Option<String> = None;
        for op in &content.operations {
            match op.operator.as_str() {
                "BT" => current = Some(String::new()),
                "ET" => {
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                }
                "Td" | "TD" | "T*" => {
                    if let Some(block) = current.as_mut() {
                        new_line(block);
                    }
                }
                "Tj" | "'" | "\"" => {
                    if let Some(block) = current.as_mut() {
                        if op.operator != "Tj" {
                            new_line(block);
                        }
                        if let Some(Object::String(bytes, _)) = op.operands.last() {
                            block.push_str(&decode_text(bytes));
                        }
                    }
                }
                "TJ" => {
                    if let (Some(block), Some(Object::Array(items))) =
                        (current.as_mut(), op.operands.first())
                    {
                        for item in items {
                            if let Object::String(bytes, _) = item {
                                block.push_str(&decode_text(bytes));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(blocks)
}

fn new_line(block: &mut String) {
    if !block.is_empty() && !block.ends_with('\n') {
        block.push('\n');
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, else Latin-1.
fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// First line of every [`TEXT_BLOCKS_PER_SAMPLE`]-th block, starting at
/// [`NAME_BLOCK_OFFSET`].
fn sample_names(blocks: &[String]) -> Vec<String> {
    (0..blocks.len() / TEXT_BLOCKS_PER_SAMPLE)
        .map(|i| {
            blocks[i * TEXT_BLOCKS_PER_SAMPLE + NAME_BLOCK_OFFSET]
                .split('\n')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .collect()
}

/// `/Type /XObject /Subtype /Image`. Untyped image streams (soft masks,
/// mostly) are not pictures and do not count towards the pairing.
fn is_image(dict: &Dictionary) -> bool {
    let is_xobject = matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"XObject");
    let is_image = matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image");
    is_xobject && is_image
}

/// Follow a reference to the object it points at.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| Error::Pdf(format!("Broken reference {} {}: {}", id.0, id.1, e))),
        other => Ok(other),
    }
}

fn dict_integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    let object = resolve(doc, dict.get(key).ok()?).ok()?;
    match object {
        Object::Integer(value) => Some(*value),
        Object::Real(value) => Some(*value as i64),
        _ => None,
    }
}

/// Names of the stream's filters, in application order.
fn filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Color space of an image, reduced to what decoding needs.
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette entries in RGB.
    Indexed(Vec<u8>),
    /// Unknown or ICC based; channel count is inferred from the data.
    Other,
}

fn color_space(doc: &Document, dict: &Dictionary) -> Result<ColorSpace> {
    let Ok(object) = dict.get(b"ColorSpace") else {
        return Ok(ColorSpace::Other);
    };
    let space = match resolve(doc, object)? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => ColorSpace::Gray,
            b"DeviceRGB" | b"CalRGB" => ColorSpace::Rgb,
            b"DeviceCMYK" => ColorSpace::Cmyk,
            _ => ColorSpace::Other,
        },
        Object::Array(items) => match items.first() {
            Some(Object::Name(name)) if name == b"Indexed" => indexed_palette(doc, items)?,
            _ => ColorSpace::Other,
        },
        _ => ColorSpace::Other,
    };
    Ok(space)
}

/// `[/Indexed base hival lookup]` with an RGB, gray or CMYK base.
fn indexed_palette(doc: &Document, items: &[Object]) -> Result<ColorSpace> {
    let base = match items.get(1).map(|o| resolve(doc, o)).transpose()? {
        Some(Object::Name(name)) => name.clone(),
        _ => b"DeviceRGB".to_vec(),
    };
    let lookup = match items.get(3).map(|o| resolve(doc, o)).transpose()? {
        Some(Object::String(bytes, _)) => bytes.clone(),
        Some(Object::Stream(stream)) => stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
        _ => return Err(Error::Image("Indexed color space without a lookup table".to_string())),
    };

    let palette = match base.as_slice() {
        b"DeviceGray" => lookup.iter().flat_map(|&g| [g, g, g]).collect(),
        b"DeviceCMYK" => lookup.chunks_exact(4).flat_map(cmyk_to_rgb).collect(),
        _ => lookup,
    };
    Ok(ColorSpace::Indexed(palette))
}

fn cmyk_to_rgb(pixel: &[u8]) -> [u8; 3] {
    let k = 255 - pixel[3] as u16;
    let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
    [channel(pixel[0]), channel(pixel[1]), channel(pixel[2])]
}

/// Width, height and pixel count of a picture, rejecting sizes that are
/// not positive or whose RGB buffer would not fit in memory.
fn dimensions(width: i64, height: i64) -> Result<(u32, u32, usize)> {
    let invalid = || Error::Image(format!("Invalid picture dimensions {}x{}", width, height));
    let w = u32::try_from(width).map_err(|_| invalid())?;
    let h = u32::try_from(height).map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    let pixels = usize::try_from(u64::from(w) * u64::from(h)).map_err(|_| invalid())?;
    pixels.checked_mul(3).ok_or_else(invalid)?;
    Ok((w, h, pixels))
}

/// Decode an image stream to RGB.
fn decode_image(doc: &Document, stream: &Stream) -> Result<RgbImage> {
    let dict = &stream.dict;
    let filters = filters(dict);

    if filters.iter().any(|f| f == b"DCTDecode") {
        return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .map(|img| img.to_rgb8())
            .map_err(|e| Error::Image(format!("Failed to decode JPEG picture: {}", e)));
    }

    let (width, height, pixels) = dimensions(
        dict_integer(doc, dict, b"Width").unwrap_or(0),
        dict_integer(doc, dict, b"Height").unwrap_or(0),
    )?;
    let bits = dict_integer(doc, dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return Err(Error::Image(format!(
            "Unsupported picture depth: {} bits per component",
            bits
        )));
    }

    let data = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|e| Error::Pdf(format!("Failed to decompress picture: {}", e)))?
    };

    let space = match color_space(doc, dict)? {
        ColorSpace::Other => match data.len() / pixels {
            1 => ColorSpace::Gray,
            4 => ColorSpace::Cmyk,
            _ => ColorSpace::Rgb,
        },
        known => known,
    };

    let rgb: Vec<u8> = match space {
        ColorSpace::Gray => data.iter().take(pixels).flat_map(|&g| [g, g, g]).collect(),
        ColorSpace::Cmyk => data.chunks_exact(4).take(pixels).flat_map(cmyk_to_rgb).collect(),
        ColorSpace::Indexed(palette) => data
            .iter()
            .take(pixels)
            .flat_map(|&i| {
                let at = i as usize * 3;
                palette
                    .get(at..at + 3)
                    .map(|p| [p[0], p[1], p[2]])
                    .unwrap_or([0, 0, 0])
            })
            .collect(),
        ColorSpace::Rgb | ColorSpace::Other => data.iter().take(pixels * 3).copied().collect(),
    };

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
        Error::Image(format!(
            "Picture data is shorter than {}x{} pixels",
            width, height
        ))
    })
}

fn encode_png(image: RgbImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::Image(format!("Failed to encode PNG: {}", e)))?;
    Ok(out.into_inner())
}
