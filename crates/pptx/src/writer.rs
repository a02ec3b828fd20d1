//! PPTX package writer.
//!
//! Produces a complete Office Open XML presentation: content types, package
//! relationships, the presentation part, one slide master with the four
//! [`Layout`]s, a theme, the slides and their pictures.

use crate::deck::{
    AutoShape, Connector, Deck, Fill, Layout, LineStyle, Media, Paragraph, Picture, Shape, Slide,
    Table, TextBox, TextFrame,
};
use crate::templates::{self, content_type, rel, NS_A, NS_CONTENT_TYPES, NS_P, NS_R, NS_RELS};
use crate::units::{Emu, Rect};
use purification_core::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Slide width: 33.867 cm (16:9).
pub const SLIDE_WIDTH: Emu = Emu(12_192_000);
/// Slide height: 19.05 cm.
pub const SLIDE_HEIGHT: Emu = Emu(6_858_000);

/// First slide id allowed by the format.
const FIRST_SLIDE_ID: usize = 256;
/// Master and layout ids share one range above 2^31.
const FIRST_MASTER_ID: u64 = 2_147_483_648;

/// Placeholder roles used by the master, the layouts and the slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Title,
    CenteredTitle,
    Subtitle,
    Body,
    SlideNumber,
}

impl Placeholder {
    fn attributes(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Placeholder::Title => &[("type", "title")],
            Placeholder::CenteredTitle => &[("type", "ctrTitle")],
            Placeholder::Subtitle => &[("type", "subTitle"), ("idx", "1")],
            Placeholder::Body => &[("type", "body"), ("idx", "1")],
            Placeholder::SlideNumber => &[("type", "sldNum"), ("sz", "quarter"), ("idx", "12")],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Placeholder::Title | Placeholder::CenteredTitle => "Title",
            Placeholder::Subtitle => "Subtitle",
            Placeholder::Body => "Text Placeholder",
            Placeholder::SlideNumber => "Slide Number Placeholder",
        }
    }
}

/// Placeholders declared by a layout, with their default frames.
fn layout_placeholders(layout: Layout) -> Vec<(Placeholder, Option<Rect>)> {
    match layout {
        Layout::Cover => vec![
            (Placeholder::CenteredTitle, Some(Rect::cm(2.54, 5.92, 28.79, 4.08))),
            (Placeholder::Subtitle, Some(Rect::cm(5.08, 10.8, 23.71, 4.87))),
        ],
        Layout::Summary | Layout::Diagram => vec![
            (Placeholder::Title, None),
            (Placeholder::SlideNumber, None),
        ],
        Layout::Evidence => vec![
            (Placeholder::Body, Some(Rect::cm(2.0, 16.2, 31.5, 3.0))),
            (Placeholder::Title, None),
            (Placeholder::SlideNumber, None),
        ],
    }
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::XmlError(format!("Failed to write XML: {}", e))
}

fn zip_error(e: zip::result::ZipError) -> Error {
    Error::ZipError(format!("Failed to write package: {}", e))
}

/// Thin event writer over an in-memory buffer.
struct Xml {
    inner: Writer<Vec<u8>>,
}

impl Xml {
    fn new() -> Result<Self> {
        let mut inner = Writer::new(Vec::new());
        inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { inner })
    }

    fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
        let mut element = BytesStart::new(name);
        for &attr in attrs {
            element.push_attribute(attr);
        }
        element
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.inner
            .write_event(Event::Start(Self::element(name, attrs)))
            .map_err(xml_error)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.inner
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.inner
            .write_event(Event::Empty(Self::element(name, attrs)))
            .map_err(xml_error)
    }

    fn leaf(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.inner
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.end(name)
    }

    /// Write pre-serialised markup unchanged.
    fn raw(&mut self, markup: &str) -> Result<()> {
        self.inner
            .write_event(Event::Text(BytesText::from_escaped(markup)))
            .map_err(xml_error)
    }

    fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }

    fn xfrm(&mut self, name: &str, frame: Rect, flips: &[(&str, &str)]) -> Result<()> {
        let (x, y) = (frame.x.to_string(), frame.y.to_string());
        let (cx, cy) = (frame.cx.to_string(), frame.cy.to_string());
        self.start(name, flips)?;
        self.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
        self.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.end(name)
    }

    fn solid_fill(&mut self, color: crate::deck::Rgb) -> Result<()> {
        self.start("a:solidFill", &[])?;
        let hex = color.hex();
        self.empty("a:srgbClr", &[("val", hex.as_str())])?;
        self.end("a:solidFill")
    }

    fn preset_geometry(&mut self, preset: &str) -> Result<()> {
        self.start("a:prstGeom", &[("prst", preset)])?;
        self.empty("a:avLst", &[])?;
        self.end("a:prstGeom")
    }

    /// Empty group properties that open every shape tree.
    fn group_header(&mut self) -> Result<()> {
        self.start("p:nvGrpSpPr", &[])?;
        self.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
        self.empty("p:cNvGrpSpPr", &[])?;
        self.empty("p:nvPr", &[])?;
        self.end("p:nvGrpSpPr")?;
        self.start("p:grpSpPr", &[])?;
        self.start("a:xfrm", &[])?;
        self.empty("a:off", &[("x", "0"), ("y", "0")])?;
        self.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
        self.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
        self.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
        self.end("a:xfrm")?;
        self.end("p:grpSpPr")
    }

    /// `a:bodyPr`, `a:lstStyle` and the paragraphs of a text frame.
    fn text_body(&mut self, frame: &TextFrame, name: &str, margins_in_body: bool) -> Result<()> {
        self.start(name, &[])?;

        let mut attrs: Vec<(&str, &str)> = Vec::new();
        if !frame.word_wrap {
            attrs.push(("wrap", "none"));
        }
        if frame.zero_margins && margins_in_body {
            attrs.extend([("lIns", "0"), ("tIns", "0"), ("rIns", "0"), ("bIns", "0")]);
        }
        attrs.push(("rtlCol", "0"));
        if let Some(anchor) = frame.anchor {
            attrs.push(("anchor", anchor.as_attr()));
        }
        if frame.word_wrap {
            self.empty("a:bodyPr", &attrs)?;
        } else {
            self.start("a:bodyPr", &attrs)?;
            self.empty("a:spAutoFit", &[])?;
            self.end("a:bodyPr")?;
        }
        self.empty("a:lstStyle", &[])?;

        if frame.paragraphs.is_empty() {
            self.start("a:p", &[])?;
            self.empty("a:endParaRPr", &[("lang", "en-US")])?;
            self.end("a:p")?;
        }
        for paragraph in &frame.paragraphs {
            self.paragraph(paragraph)?;
        }

        self.end(name)
    }

    fn paragraph(&mut self, paragraph: &Paragraph) -> Result<()> {
        self.start("a:p", &[])?;

        let level = paragraph.level.to_string();
        let mut attrs: Vec<(&str, &str)> = Vec::new();
        if paragraph.level > 0 {
            attrs.push(("lvl", level.as_str()));
        }
        if let Some(align) = paragraph.align {
            attrs.push(("algn", align.as_attr()));
        }
        if !attrs.is_empty() {
            self.empty("a:pPr", &attrs)?;
        }

        for run in paragraph.runs.iter().filter(|r| !r.text.is_empty()) {
            let style = run.style.or(paragraph.style);
            self.start("a:r", &[])?;
            self.run_properties("a:rPr", style)?;
            self.leaf("a:t", &[], &run.text)?;
            self.end("a:r")?;
        }

        self.run_properties("a:endParaRPr", paragraph.style)?;
        self.end("a:p")
    }

    fn run_properties(&mut self, name: &str, style: crate::deck::RunStyle) -> Result<()> {
        let size = style.size.map(|s| s.to_string());
        let mut attrs: Vec<(&str, &str)> = vec![("lang", "en-US")];
        if let Some(size) = size.as_deref() {
            attrs.push(("sz", size));
        }
        if let Some(bold) = style.bold {
            attrs.push(("b", if bold { "1" } else { "0" }));
        }
        if let Some(italic) = style.italic {
            attrs.push(("i", if italic { "1" } else { "0" }));
        }
        attrs.push(("dirty", "0"));

        match style.color {
            Some(color) => {
                self.start(name, &attrs)?;
                self.solid_fill(color)?;
                self.end(name)
            }
            None => self.empty(name, &attrs),
        }
    }

    fn relationships(&mut self, rels: &[(String, &str, String)]) -> Result<()> {
        self.start("Relationships", &[("xmlns", NS_RELS)])?;
        for (id, kind, target) in rels {
            self.empty(
                "Relationship",
                &[("Id", id.as_str()), ("Type", kind), ("Target", target.as_str())],
            )?;
        }
        self.end("Relationships")
    }
}

/// Distinct pictures of a deck, in first-use order.
#[derive(Default)]
struct MediaStore<'a> {
    items: Vec<&'a Media>,
}

impl<'a> MediaStore<'a> {
    /// Index of `media`, adding it when unseen.
    fn intern(&mut self, media: &'a Media) -> usize {
        if let Some(index) = self.items.iter().position(|m| m.bytes == media.bytes) {
            return index;
        }
        self.items.push(media);
        self.items.len() - 1
    }

    fn file_name(&self, index: usize) -> String {
        format!("image{}.{}", index + 1, self.items[index].extension)
    }
}

/// Writer for PPTX (Office Open XML) packages.
pub struct PptxWriter;

impl PptxWriter {
    /// Create a new PPTX writer.
    pub fn new() -> Self {
        Self
    }

    /// Save a deck to `path`, replacing any existing file.
    pub fn save(&self, deck: &Deck, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write(deck, file)?;
        log::info!("Saved {} slides to '{}'", deck.len(), path.display());
        Ok(())
    }

    /// Write a deck as a PPTX package to any seekable writer.
    pub fn write<W: Write + Seek>(&self, deck: &Deck, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut media = MediaStore::default();
        let mut slide_parts = Vec::with_capacity(deck.len());
        for slide in deck.slides() {
            slide_parts.push(self.slide_part(slide, &mut media)?);
        }

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".to_string(), self.content_types(deck, &media)?),
            ("_rels/.rels".to_string(), self.package_rels()?),
            ("docProps/core.xml".to_string(), self.core_properties(deck)?),
            ("docProps/app.xml".to_string(), self.app_properties(deck)?),
            ("ppt/presentation.xml".to_string(), self.presentation(deck)?),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                self.presentation_rels(deck)?,
            ),
            ("ppt/presProps.xml".to_string(), templates::PRES_PROPS.as_bytes().to_vec()),
            ("ppt/viewProps.xml".to_string(), templates::VIEW_PROPS.as_bytes().to_vec()),
            ("ppt/tableStyles.xml".to_string(), templates::TABLE_STYLES.as_bytes().to_vec()),
            ("ppt/theme/theme1.xml".to_string(), templates::THEME.as_bytes().to_vec()),
            ("ppt/slideMasters/slideMaster1.xml".to_string(), self.master()?),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
                self.master_rels()?,
            ),
        ];

        for layout in Layout::ALL {
            let n = layout.index() + 1;
            parts.push((
                format!("ppt/slideLayouts/slideLayout{}.xml", n),
                self.layout_part(layout)?,
            ));
            parts.push((
                format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n),
                self.layout_rels()?,
            ));
        }

        for (index, (xml, rels)) in slide_parts.into_iter().enumerate() {
            parts.push((format!("ppt/slides/slide{}.xml", index + 1), xml));
            parts.push((format!("ppt/slides/_rels/slide{}.xml.rels", index + 1), rels));
        }

        for (name, bytes) in parts {
            zip.start_file(name, options).map_err(zip_error)?;
            zip.write_all(&bytes)?;
        }

        for (index, item) in media.items.iter().enumerate() {
            zip.start_file(format!("ppt/media/{}", media.file_name(index)), options)
                .map_err(zip_error)?;
            zip.write_all(&item.bytes)?;
        }

        zip.finish().map_err(zip_error)?;
        Ok(())
    }

    fn content_types(&self, deck: &Deck, media: &MediaStore) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
        xml.empty("Default", &[("Extension", "rels"), ("ContentType", content_type::RELS)])?;
        xml.empty("Default", &[("Extension", "xml"), ("ContentType", content_type::XML)])?;

        let mut extensions: Vec<(&str, &str)> = Vec::new();
        for item in &media.items {
            if !extensions.iter().any(|(ext, _)| *ext == item.extension) {
                extensions.push((item.extension, item.content_type));
            }
        }
        for (ext, kind) in extensions {
            xml.empty("Default", &[("Extension", ext), ("ContentType", kind)])?;
        }

        let mut overrides: Vec<(String, &str)> = vec![
            ("/ppt/presentation.xml".to_string(), content_type::PRESENTATION),
            ("/ppt/slideMasters/slideMaster1.xml".to_string(), content_type::SLIDE_MASTER),
            ("/ppt/theme/theme1.xml".to_string(), content_type::THEME),
            ("/ppt/presProps.xml".to_string(), content_type::PRES_PROPS),
            ("/ppt/viewProps.xml".to_string(), content_type::VIEW_PROPS),
            ("/ppt/tableStyles.xml".to_string(), content_type::TABLE_STYLES),
            ("/docProps/core.xml".to_string(), content_type::CORE_PROPERTIES),
            ("/docProps/app.xml".to_string(), content_type::EXTENDED_PROPERTIES),
        ];
        for layout in Layout::ALL {
            overrides.push((
                format!("/ppt/slideLayouts/slideLayout{}.xml", layout.index() + 1),
                content_type::SLIDE_LAYOUT,
            ));
        }
        for n in 1..=deck.len() {
            overrides.push((format!("/ppt/slides/slide{}.xml", n), content_type::SLIDE));
        }
        for (part, kind) in &overrides {
            xml.empty("Override", &[("PartName", part.as_str()), ("ContentType", kind)])?;
        }

        xml.end("Types")?;
        Ok(xml.into_bytes())
    }

    fn package_rels(&self) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.relationships(&[
            ("rId1".to_string(), rel::OFFICE_DOCUMENT, "ppt/presentation.xml".to_string()),
            ("rId2".to_string(), rel::CORE_PROPERTIES, "docProps/core.xml".to_string()),
            ("rId3".to_string(), rel::EXTENDED_PROPERTIES, "docProps/app.xml".to_string()),
        ])?;
        Ok(xml.into_bytes())
    }

    fn core_properties(&self, deck: &Deck) -> Result<Vec<u8>> {
        let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let mut xml = Xml::new()?;
        xml.start(
            "cp:coreProperties",
            &[
                (
                    "xmlns:cp",
                    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
                ),
                ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
                ("xmlns:dcterms", "http://purl.org/dc/terms/"),
                ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ],
        )?;
        xml.leaf("dc:title", &[], deck.title().unwrap_or(""))?;
        xml.leaf("dc:creator", &[], env!("CARGO_PKG_NAME"))?;
        xml.leaf("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
        xml.leaf("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
        xml.end("cp:coreProperties")?;
        Ok(xml.into_bytes())
    }

    fn app_properties(&self, deck: &Deck) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.start(
            "Properties",
            &[(
                "xmlns",
                "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
            )],
        )?;
        xml.leaf("Application", &[], env!("CARGO_PKG_NAME"))?;
        xml.leaf("Slides", &[], &deck.len().to_string())?;
        xml.end("Properties")?;
        Ok(xml.into_bytes())
    }

    fn presentation(&self, deck: &Deck) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.start(
            "p:presentation",
            &[
                ("xmlns:a", NS_A),
                ("xmlns:r", NS_R),
                ("xmlns:p", NS_P),
                ("saveSubsetFonts", "1"),
            ],
        )?;

        let master_id = FIRST_MASTER_ID.to_string();
        xml.start("p:sldMasterIdLst", &[])?;
        xml.empty("p:sldMasterId", &[("id", master_id.as_str()), ("r:id", "rId1")])?;
        xml.end("p:sldMasterIdLst")?;

        if !deck.is_empty() {
            xml.start("p:sldIdLst", &[])?;
            for index in 0..deck.len() {
                let id = (FIRST_SLIDE_ID + index).to_string();
                let rid = slide_rel_id(index);
                xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rid.as_str())])?;
            }
            xml.end("p:sldIdLst")?;
        }

        let (cx, cy) = (SLIDE_WIDTH.to_string(), SLIDE_HEIGHT.to_string());
        xml.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        xml.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;
        xml.end("p:presentation")?;
        Ok(xml.into_bytes())
    }

    /// The master is `rId1`, slides follow from `rId2` so that relationship
    /// ids sort in slide order, and the remaining parts come last.
    fn presentation_rels(&self, deck: &Deck) -> Result<Vec<u8>> {
        let mut rels = vec![(
            "rId1".to_string(),
            rel::SLIDE_MASTER,
            "slideMasters/slideMaster1.xml".to_string(),
        )];
        for index in 0..deck.len() {
            rels.push((slide_rel_id(index), rel::SLIDE, format!("slides/slide{}.xml", index + 1)));
        }
        let next = deck.len() + 2;
        rels.push((format!("rId{}", next), rel::PRES_PROPS, "presProps.xml".to_string()));
        rels.push((format!("rId{}", next + 1), rel::VIEW_PROPS, "viewProps.xml".to_string()));
        rels.push((format!("rId{}", next + 2), rel::THEME, "theme/theme1.xml".to_string()));
        rels.push((format!("rId{}", next + 3), rel::TABLE_STYLES, "tableStyles.xml".to_string()));

        let mut xml = Xml::new()?;
        xml.relationships(&rels)?;
        Ok(xml.into_bytes())
    }

    fn master(&self) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.start("p:sldMaster", &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)])?;
        xml.start("p:cSld", &[])?;
        xml.start("p:bg", &[])?;
        xml.start("p:bgRef", &[("idx", "1001")])?;
        xml.empty("a:schemeClr", &[("val", "bg1")])?;
        xml.end("p:bgRef")?;
        xml.end("p:bg")?;
        xml.start("p:spTree", &[])?;
        xml.group_header()?;
        let placeholders = [
            (Placeholder::Title, Some(Rect::cm(0.6, 0.3, 32.6, 2.4))),
            (Placeholder::Body, Some(Rect::cm(2.0, 4.0, 29.9, 12.0))),
            (Placeholder::SlideNumber, Some(Rect::cm(24.6, 17.65, 7.9, 1.0))),
        ];
        for (id, (placeholder, frame)) in placeholders.into_iter().enumerate() {
            write_placeholder(&mut xml, id + 2, placeholder, frame, None, None)?;
        }
        xml.end("p:spTree")?;
        xml.end("p:cSld")?;

        xml.empty("p:clrMap", &templates::COLOR_MAP)?;

        xml.start("p:sldLayoutIdLst", &[])?;
        for layout in Layout::ALL {
            let id = (FIRST_MASTER_ID + 1 + layout.index() as u64).to_string();
            let rid = format!("rId{}", layout.index() + 1);
            xml.empty("p:sldLayoutId", &[("id", id.as_str()), ("r:id", rid.as_str())])?;
        }
        xml.end("p:sldLayoutIdLst")?;
        xml.raw(templates::MASTER_TEXT_STYLES)?;
        xml.end("p:sldMaster")?;
        Ok(xml.into_bytes())
    }

    fn master_rels(&self) -> Result<Vec<u8>> {
        let mut rels: Vec<(String, &str, String)> = Layout::ALL
            .iter()
            .map(|layout| {
                let n = layout.index() + 1;
                (
                    format!("rId{}", n),
                    rel::SLIDE_LAYOUT,
                    format!("../slideLayouts/slideLayout{}.xml", n),
                )
            })
            .collect();
        rels.push((
            format!("rId{}", Layout::ALL.len() + 1),
            rel::THEME,
            "../theme/theme1.xml".to_string(),
        ));

        let mut xml = Xml::new()?;
        xml.relationships(&rels)?;
        Ok(xml.into_bytes())
    }

    fn layout_part(&self, layout: Layout) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.start(
            "p:sldLayout",
            &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P), ("preserve", "1")],
        )?;
        xml.start("p:cSld", &[("name", layout.name())])?;
        xml.start("p:spTree", &[])?;
        xml.group_header()?;
        for (id, (placeholder, frame)) in layout_placeholders(layout).into_iter().enumerate() {
            write_placeholder(&mut xml, id + 2, placeholder, frame, None, None)?;
        }
        xml.end("p:spTree")?;
        xml.end("p:cSld")?;
        xml.start("p:clrMapOvr", &[])?;
        xml.empty("a:masterClrMapping", &[])?;
        xml.end("p:clrMapOvr")?;
        xml.end("p:sldLayout")?;
        Ok(xml.into_bytes())
    }

    fn layout_rels(&self) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.relationships(&[(
            "rId1".to_string(),
            rel::SLIDE_MASTER,
            "../slideMasters/slideMaster1.xml".to_string(),
        )])?;
        Ok(xml.into_bytes())
    }

    /// Slide XML and its relationships part.
    fn slide_part<'a>(&self, slide: &'a Slide, media: &mut MediaStore<'a>) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut rels: Vec<(String, &str, String)> = vec![(
            "rId1".to_string(),
            rel::SLIDE_LAYOUT,
            format!("../slideLayouts/slideLayout{}.xml", slide.layout.index() + 1),
        )];
        // media index -> relationship id on this slide
        let mut picture_rels: Vec<(usize, String)> = Vec::new();

        let mut xml = Xml::new()?;
        xml.start("p:sld", &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)])?;
        xml.start("p:cSld", &[])?;
        xml.start("p:spTree", &[])?;
        xml.group_header()?;

        let mut last_id = 1usize;
        let mut next_id = || {
            last_id += 1;
            last_id
        };

        if let Some(title) = &slide.title {
            let placeholder = if slide.layout == Layout::Cover {
                Placeholder::CenteredTitle
            } else {
                Placeholder::Title
            };
            write_placeholder(&mut xml, next_id(), placeholder, None, None, Some(title))?;
        }
        if let Some(subtitle) = &slide.subtitle {
            write_placeholder(&mut xml, next_id(), Placeholder::Subtitle, None, None, Some(subtitle))?;
        }
        if let Some(body) = &slide.body {
            write_placeholder(&mut xml, next_id(), Placeholder::Body, Some(body.frame), None, Some(&body.text))?;
        }

        for shape in &slide.shapes {
            let id = next_id();
            match shape {
                Shape::Auto(shape) => write_auto_shape(&mut xml, id, shape)?,
                Shape::TextBox(textbox) => write_textbox(&mut xml, id, textbox)?,
                Shape::Connector(connector) => write_connector(&mut xml, id, connector)?,
                Shape::Table(table) => write_table(&mut xml, id, table)?,
                Shape::Picture(picture) => {
                    let index = media.intern(&picture.media);
                    let rid = match picture_rels.iter().find(|(i, _)| *i == index) {
                        Some((_, rid)) => rid.clone(),
                        None => {
                            let rid = format!("rId{}", rels.len() + 1);
                            rels.push((rid.clone(), rel::IMAGE, format!("../media/{}", media.file_name(index))));
                            picture_rels.push((index, rid.clone()));
                            rid
                        }
                    };
                    write_picture(&mut xml, id, picture, &rid)?;
                }
            }
        }

        if let Some(number) = slide.number {
            let text = TextFrame::from_text(number.to_string());
            write_placeholder(
                &mut xml,
                next_id(),
                Placeholder::SlideNumber,
                None,
                Some(number),
                Some(&text),
            )?;
        }

        xml.end("p:spTree")?;
        xml.end("p:cSld")?;
        xml.start("p:clrMapOvr", &[])?;
        xml.empty("a:masterClrMapping", &[])?;
        xml.end("p:clrMapOvr")?;
        xml.end("p:sld")?;

        let mut rels_xml = Xml::new()?;
        rels_xml.relationships(&rels)?;
        Ok((xml.into_bytes(), rels_xml.into_bytes()))
    }
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Relationship id of the slide at `index` in the presentation part.
fn slide_rel_id(index: usize) -> String {
    format!("rId{}", index + 2)
}

fn write_placeholder(
    xml: &mut Xml,
    id: usize,
    placeholder: Placeholder,
    frame: Option<Rect>,
    slide_number: Option<usize>,
    text: Option<&TextFrame>,
) -> Result<()> {
    let id_text = id.to_string();
    let name = format!("{} {}", placeholder.name(), id - 1);

    xml.start("p:sp", &[])?;
    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", id_text.as_str()), ("name", name.as_str())])?;
    xml.start("p:cNvSpPr", &[])?;
    xml.empty("a:spLocks", &[("noGrp", "1")])?;
    xml.end("p:cNvSpPr")?;
    xml.start("p:nvPr", &[])?;
    xml.empty("p:ph", placeholder.attributes())?;
    xml.end("p:nvPr")?;
    xml.end("p:nvSpPr")?;

    match frame {
        Some(frame) => {
            xml.start("p:spPr", &[])?;
            xml.xfrm("a:xfrm", frame, &[])?;
            xml.end("p:spPr")?;
        }
        None => xml.empty("p:spPr", &[])?,
    }

    match (text, slide_number) {
        (Some(_), Some(number)) => {
            // Slide numbers are a field so the viewer can renumber them.
            xml.start("p:txBody", &[])?;
            xml.empty("a:bodyPr", &[])?;
            xml.empty("a:lstStyle", &[])?;
            xml.start("a:p", &[])?;
            xml.start("a:fld", &[("id", "{B6F15528-21DE-4FAA-801E-634DDDAF4B2B}"), ("type", "slidenum")])?;
            xml.empty("a:rPr", &[("lang", "en-US")])?;
            xml.leaf("a:t", &[], &number.to_string())?;
            xml.end("a:fld")?;
            xml.empty("a:endParaRPr", &[("lang", "en-US")])?;
            xml.end("a:p")?;
            xml.end("p:txBody")?;
        }
        (Some(text), None) => xml.text_body(text, "p:txBody", true)?,
        (None, _) => {
            xml.start("p:txBody", &[])?;
            xml.empty("a:bodyPr", &[])?;
            xml.empty("a:lstStyle", &[])?;
            xml.start("a:p", &[])?;
            xml.empty("a:endParaRPr", &[("lang", "en-US")])?;
            xml.end("a:p")?;
            xml.end("p:txBody")?;
        }
    }

    xml.end("p:sp")
}

fn write_auto_shape(xml: &mut Xml, id: usize, shape: &AutoShape) -> Result<()> {
    let id_text = id.to_string();
    let name = format!("{} {}", shape.kind.display_name(), id - 1);

    xml.start("p:sp", &[])?;
    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", id_text.as_str()), ("name", name.as_str())])?;
    xml.empty("p:cNvSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvSpPr")?;

    xml.start("p:spPr", &[])?;
    xml.xfrm("a:xfrm", shape.frame, &[])?;
    xml.preset_geometry(shape.kind.preset())?;
    match shape.fill {
        Fill::Inherit => {}
        Fill::None => xml.empty("a:noFill", &[])?,
        Fill::Solid(color) => xml.solid_fill(color)?,
    }
    match shape.outline {
        LineStyle::Inherit => {}
        LineStyle::None => {
            xml.start("a:ln", &[])?;
            xml.empty("a:noFill", &[])?;
            xml.end("a:ln")?;
        }
        LineStyle::Solid { color, width } => {
            let width = width.map(|w| w.to_string());
            let attrs: Vec<(&str, &str)> = width.as_deref().map(|w| ("w", w)).into_iter().collect();
            xml.start("a:ln", &attrs)?;
            xml.solid_fill(color)?;
            xml.end("a:ln")?;
        }
    }
    if shape.no_shadow {
        xml.empty("a:effectLst", &[])?;
    }
    xml.end("p:spPr")?;

    write_shape_style(xml, "2", "1", "lt1")?;

    let mut text = shape.text.clone();
    if text.anchor.is_none() {
        text.anchor = Some(crate::deck::Anchor::Middle);
    }
    xml.text_body(&text, "p:txBody", true)?;
    xml.end("p:sp")
}

fn write_shape_style(xml: &mut Xml, line_idx: &str, fill_idx: &str, font_color: &str) -> Result<()> {
    xml.start("p:style", &[])?;
    xml.start("a:lnRef", &[("idx", line_idx)])?;
    xml.empty("a:schemeClr", &[("val", "accent1")])?;
    xml.end("a:lnRef")?;
    xml.start("a:fillRef", &[("idx", fill_idx)])?;
    xml.empty("a:schemeClr", &[("val", "accent1")])?;
    xml.end("a:fillRef")?;
    xml.start("a:effectRef", &[("idx", "0")])?;
    xml.empty("a:schemeClr", &[("val", "accent1")])?;
    xml.end("a:effectRef")?;
    xml.start("a:fontRef", &[("idx", "minor")])?;
    xml.empty("a:schemeClr", &[("val", font_color)])?;
    xml.end("a:fontRef")?;
    xml.end("p:style")
}

fn write_textbox(xml: &mut Xml, id: usize, textbox: &TextBox) -> Result<()> {
    let id_text = id.to_string();
    let name = format!("TextBox {}", id - 1);

    xml.start("p:sp", &[])?;
    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", id_text.as_str()), ("name", name.as_str())])?;
    xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvSpPr")?;
    xml.start("p:spPr", &[])?;
    xml.xfrm("a:xfrm", textbox.frame, &[])?;
    xml.preset_geometry("rect")?;
    xml.empty("a:noFill", &[])?;
    xml.end("p:spPr")?;
    xml.text_body(&textbox.text, "p:txBody", true)?;
    xml.end("p:sp")
}

fn write_connector(xml: &mut Xml, id: usize, connector: &Connector) -> Result<()> {
    let id_text = id.to_string();
    let name = format!("Straight Connector {}", id - 1);

    let (from, to) = (connector.from, connector.to);
    let frame = Rect {
        x: from.x.min(to.x),
        y: from.y.min(to.y),
        cx: Emu((to.x.value() - from.x.value()).abs()),
        cy: Emu((to.y.value() - from.y.value()).abs()),
    };
    let mut flips: Vec<(&str, &str)> = Vec::new();
    if to.x < from.x {
        flips.push(("flipH", "1"));
    }
    if to.y < from.y {
        flips.push(("flipV", "1"));
    }

    xml.start("p:cxnSp", &[])?;
    xml.start("p:nvCxnSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", id_text.as_str()), ("name", name.as_str())])?;
    xml.empty("p:cNvCxnSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvCxnSpPr")?;
    xml.start("p:spPr", &[])?;
    xml.xfrm("a:xfrm", frame, &flips)?;
    xml.preset_geometry("line")?;
    xml.start("a:ln", &[])?;
    xml.solid_fill(connector.color)?;
    xml.end("a:ln")?;
    xml.empty("a:effectLst", &[])?;
    xml.end("p:spPr")?;
    write_shape_style(xml, "1", "0", "tx1")?;
    xml.end("p:cxnSp")
}

fn write_picture(xml: &mut Xml, id: usize, picture: &Picture, rid: &str) -> Result<()> {
    let id_text = id.to_string();
    let name = format!("Picture {}", id - 1);

    xml.start("p:pic", &[])?;
    xml.start("p:nvPicPr", &[])?;
    xml.empty(
        "p:cNvPr",
        &[("id", id_text.as_str()), ("name", name.as_str()), ("descr", picture.description.as_str())],
    )?;
    xml.start("p:cNvPicPr", &[])?;
    xml.empty("a:picLocks", &[("noChangeAspect", "1")])?;
    xml.end("p:cNvPicPr")?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvPicPr")?;

    xml.start("p:blipFill", &[])?;
    xml.empty("a:blip", &[("r:embed", rid)])?;
    xml.start("a:stretch", &[])?;
    xml.empty("a:fillRect", &[])?;
    xml.end("a:stretch")?;
    xml.end("p:blipFill")?;

    xml.start("p:spPr", &[])?;
    xml.xfrm("a:xfrm", picture.frame, &[])?;
    xml.preset_geometry("rect")?;
    if let Some(color) = picture.outline {
        xml.start("a:ln", &[])?;
        xml.solid_fill(color)?;
        xml.end("a:ln")?;
    }
    xml.end("p:spPr")?;
    xml.end("p:pic")
}

fn write_table(xml: &mut Xml, id: usize, table: &Table) -> Result<()> {
    let id_text = id.to_string();
    let name = format!("Table {}", id - 1);
    let (cx, cy) = table.extent();

    xml.start("p:graphicFrame", &[])?;
    xml.start("p:nvGraphicFramePr", &[])?;
    xml.empty("p:cNvPr", &[("id", id_text.as_str()), ("name", name.as_str())])?;
    xml.start("p:cNvGraphicFramePr", &[])?;
    xml.empty("a:graphicFrameLocks", &[("noGrp", "1")])?;
    xml.end("p:cNvGraphicFramePr")?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGraphicFramePr")?;
    xml.xfrm("p:xfrm", Rect::at(table.origin, cx, cy), &[])?;

    xml.start("a:graphic", &[])?;
    xml.start(
        "a:graphicData",
        &[("uri", "http://schemas.openxmlformats.org/drawingml/2006/table")],
    )?;
    xml.start("a:tbl", &[])?;
    xml.start("a:tblPr", &[("firstRow", "1"), ("bandRow", "1")])?;
    xml.leaf("a:tableStyleId", &[], templates::DEFAULT_TABLE_STYLE)?;
    xml.end("a:tblPr")?;

    xml.start("a:tblGrid", &[])?;
    for width in &table.columns {
        let w = width.to_string();
        xml.empty("a:gridCol", &[("w", w.as_str())])?;
    }
    xml.end("a:tblGrid")?;

    for row in &table.rows {
        let height = row.height.to_string();
        xml.start("a:tr", &[("h", height.as_str())])?;
        for cell in &row.cells {
            let span = cell.grid_span.to_string();
            let mut attrs: Vec<(&str, &str)> = Vec::new();
            if cell.grid_span > 1 {
                attrs.push(("gridSpan", span.as_str()));
            }
            if cell.h_merge {
                attrs.push(("hMerge", "1"));
            }
            xml.start("a:tc", &attrs)?;
            xml.text_body(&cell.text, "a:txBody", false)?;

            let mut props: Vec<(&str, &str)> = Vec::new();
            if cell.text.zero_margins {
                props.extend([("marL", "0"), ("marR", "0"), ("marT", "0"), ("marB", "0")]);
            }
            if let Some(anchor) = cell.text.anchor {
                props.push(("anchor", anchor.as_attr()));
            }
            xml.empty("a:tcPr", &props)?;
            xml.end("a:tc")?;
        }
        xml.end("a:tr")?;
    }

    xml.end("a:tbl")?;
    xml.end("a:graphicData")?;
    xml.end("a:graphic")?;
    xml.end("p:graphicFrame")
}
