//! In-memory slide deck: slides, placeholders, shapes, tables and pictures.
//!
//! Builders fill a [`Deck`] and hand it to the writer to persist. Nothing
//! here touches the file system except [`Slide::add_picture`], which reads
//! the picture bytes immediately so the source file can be removed right
//! after placement.

use crate::units::{Emu, FontSize, Point, Rect};
use purification_core::{Error, Result};
use std::io::Cursor;
use std::path::Path;

/// Slide layouts provided by the generated master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Title and subtitle placeholders.
    Cover,
    /// Title placeholder over a wide table area.
    Summary,
    /// Title placeholder over a diagram area.
    Diagram,
    /// Title and body placeholders for gel and chromatography pages.
    Evidence,
}

impl Layout {
    pub const ALL: [Layout; 4] = [
        Layout::Cover,
        Layout::Summary,
        Layout::Diagram,
        Layout::Evidence,
    ];

    /// Position of the layout in the master's layout list.
    pub fn index(self) -> usize {
        match self {
            Layout::Cover => 0,
            Layout::Summary => 1,
            Layout::Diagram => 2,
            Layout::Evidence => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layout::Cover => "Cover",
            Layout::Summary => "Summary Table",
            Layout::Diagram => "Diagram",
            Layout::Evidence => "Evidence",
        }
    }
}

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Upper-case hex form used by `a:srgbClr`.
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub(crate) fn as_attr(self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

/// Vertical anchoring of text inside a frame or cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Top,
    Middle,
    Bottom,
}

impl Anchor {
    pub(crate) fn as_attr(self) -> &'static str {
        match self {
            Anchor::Top => "t",
            Anchor::Middle => "ctr",
            Anchor::Bottom => "b",
        }
    }
}

/// Character formatting. Unset fields inherit from the placeholder or theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub size: Option<FontSize>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Rgb>,
}

impl RunStyle {
    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: RunStyle) -> RunStyle {
        RunStyle {
            size: self.size.or(fallback.size),
            bold: self.bold.or(fallback.bold),
            italic: self.italic.or(fallback.italic),
            color: self.color.or(fallback.color),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == RunStyle::default()
    }
}

/// A run of uniformly formatted text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub style: RunStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
        }
    }

    pub fn size(mut self, size: FontSize) -> Self {
        self.style.size = Some(size);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.style.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.style.italic = Some(italic);
        self
    }
}

/// A paragraph: runs plus paragraph-level formatting.
///
/// `style` applies to every run that does not override it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub style: RunStyle,
    pub align: Option<Align>,
    /// Outline level, 0 for top level.
    pub level: u8,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph holding a single unformatted run.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![TextRun::new(text)],
            ..Default::default()
        }
    }

    pub fn run(mut self, run: TextRun) -> Self {
        self.runs.push(run);
        self
    }

    pub fn size(mut self, size: FontSize) -> Self {
        self.style.size = Some(size);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.style.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.style.italic = Some(italic);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Concatenated text of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Text content of a shape, placeholder or table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
    pub anchor: Option<Anchor>,
    /// Remove the default inner margins.
    pub zero_margins: bool,
    pub word_wrap: bool,
}

impl Default for TextFrame {
    fn default() -> Self {
        Self {
            paragraphs: Vec::new(),
            anchor: None,
            zero_margins: false,
            word_wrap: true,
        }
    }
}

impl TextFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame with one paragraph of plain text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new().with_paragraph(Paragraph::text(text))
    }

    pub fn with_paragraph(mut self, paragraph: Paragraph) -> Self {
        self.paragraphs.push(paragraph);
        self
    }

    /// Append a paragraph and return it for further formatting.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) -> &mut Paragraph {
        self.paragraphs.push(paragraph);
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    /// Replace the content with a single plain paragraph.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.paragraphs = vec![Paragraph::text(text)];
    }

    /// Paragraph texts joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Apply size and alignment to every paragraph.
    pub fn format_paragraphs(&mut self, size: FontSize, align: Option<Align>) {
        for paragraph in &mut self.paragraphs {
            paragraph.style.size = Some(size);
            if align.is_some() {
                paragraph.align = align;
            }
        }
    }
}

/// Preset geometry of an auto shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    RoundedRectangle,
    RightArrow,
}

impl ShapeKind {
    pub(crate) fn preset(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rect",
            ShapeKind::RoundedRectangle => "roundRect",
            ShapeKind::RightArrow => "rightArrow",
        }
    }

    pub(crate) fn display_name(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::RoundedRectangle => "Rounded Rectangle",
            ShapeKind::RightArrow => "Right Arrow",
        }
    }
}

/// Shape interior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fill {
    /// Use the theme style.
    #[default]
    Inherit,
    /// Transparent.
    None,
    Solid(Rgb),
}

/// Shape outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    Inherit,
    None,
    Solid { color: Rgb, width: Option<Emu> },
}

/// A preset geometry shape with optional text.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoShape {
    pub kind: ShapeKind,
    pub frame: Rect,
    pub fill: Fill,
    pub outline: LineStyle,
    /// Drop the theme's inherited shadow.
    pub no_shadow: bool,
    pub text: TextFrame,
}

impl AutoShape {
    pub fn fill(&mut self, fill: Fill) -> &mut Self {
        self.fill = fill;
        self
    }

    pub fn outline(&mut self, outline: LineStyle) -> &mut Self {
        self.outline = outline;
        self
    }

    pub fn without_shadow(&mut self) -> &mut Self {
        self.no_shadow = true;
        self
    }
}

/// A free text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub frame: Rect,
    pub text: TextFrame,
}

/// Encoded picture data as stored in the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub content_type: &'static str,
}

impl Media {
    /// Identify the picture format from its leading bytes.
    ///
    /// EMF pictures, which word processors embed for vector drawings, are
    /// carried through unchanged.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let (extension, content_type) = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png) => ("png", "image/png"),
            Ok(image::ImageFormat::Jpeg) => ("jpeg", "image/jpeg"),
            Ok(image::ImageFormat::Gif) => ("gif", "image/gif"),
            Ok(image::ImageFormat::Bmp) => ("bmp", "image/bmp"),
            Ok(image::ImageFormat::Tiff) => ("tiff", "image/tiff"),
            _ if bytes.len() >= 44 && &bytes[40..44] == b" EMF" => ("emf", "image/x-emf"),
            _ => {
                return Err(Error::Image(
                    "Unsupported picture format (expected PNG, JPEG, GIF, BMP, TIFF or EMF)"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            bytes,
            extension,
            content_type,
        })
    }

    /// Pixel dimensions, when the format can be decoded.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        image::ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

/// A placed picture.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub frame: Rect,
    pub media: Media,
    /// File name shown as the picture description.
    pub description: String,
    pub outline: Option<Rgb>,
}

/// A straight connector line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    pub from: Point,
    pub to: Point,
    pub color: Rgb,
}

/// One cell of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub text: TextFrame,
    /// Number of grid columns covered by a merge origin.
    pub grid_span: u32,
    /// Set on cells covered by a merge to their left.
    pub h_merge: bool,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            text: TextFrame::new(),
            grid_span: 1,
            h_merge: false,
        }
    }
}

/// A row of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub height: Emu,
    pub cells: Vec<TableCell>,
}

/// A table placed in a graphic frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub origin: Point,
    pub columns: Vec<Emu>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a table, dividing `frame` evenly between rows and columns.
    pub fn new(rows: usize, cols: usize, frame: Rect) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let width = Emu(frame.cx.value() / cols as i64);
        let height = Emu(frame.cy.value() / rows as i64);

        Self {
            origin: Point {
                x: frame.x,
                y: frame.y,
            },
            columns: vec![width; cols],
            rows: (0..rows)
                .map(|_| TableRow {
                    height,
                    cells: vec![TableCell::default(); cols],
                })
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cell at `(row, col)`. Panics when out of range, like slice indexing.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut TableCell {
        &mut self.rows[row].cells[col]
    }

    pub fn set_text(&mut self, row: usize, col: usize, text: impl Into<String>) {
        self.cell_mut(row, col).text.set_text(text);
    }

    /// Text of the cell at `(row, col)`, empty when out of range.
    pub fn cell_text(&self, row: usize, col: usize) -> String {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(col))
            .map(|c| c.text.text())
            .unwrap_or_default()
    }

    pub fn set_column_width(&mut self, col: usize, width: Emu) {
        if let Some(column) = self.columns.get_mut(col) {
            *column = width;
        }
    }

    pub fn set_row_height(&mut self, row: usize, height: Emu) {
        if let Some(r) = self.rows.get_mut(row) {
            r.height = height;
        }
    }

    /// Merge cells `from..=to` of `row` into the cell at `from`.
    pub fn merge_row_span(&mut self, row: usize, from: usize, to: usize) {
        let Some(r) = self.rows.get_mut(row) else {
            return;
        };
        let to = to.min(r.cells.len().saturating_sub(1));
        if from >= to {
            return;
        }
        r.cells[from].grid_span = (to - from + 1) as u32;
        for cell in &mut r.cells[from + 1..=to] {
            cell.h_merge = true;
        }
    }

    /// Uniform cell formatting: zero margins, anchor, font size, alignment.
    pub fn style_cells(&mut self, size: FontSize, align: Align, anchor: Anchor) {
        for row in &mut self.rows {
            for cell in &mut row.cells {
                cell.text.zero_margins = true;
                cell.text.anchor = Some(anchor);
                if cell.text.paragraphs.is_empty() {
                    cell.text.paragraphs.push(Paragraph::new());
                }
                cell.text.format_paragraphs(size, Some(align));
            }
        }
    }

    /// Total width and height from the column and row sizes.
    pub fn extent(&self) -> (Emu, Emu) {
        let cx = self.columns.iter().map(|c| c.value()).sum();
        let cy = self.rows.iter().map(|r| r.height.value()).sum();
        (Emu(cx), Emu(cy))
    }
}

/// A shape on a slide's shape tree, in z-order.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Auto(AutoShape),
    TextBox(TextBox),
    Picture(Picture),
    Connector(Connector),
    Table(Table),
}

impl From<AutoShape> for Shape {
    fn from(shape: AutoShape) -> Self {
        Shape::Auto(shape)
    }
}

impl From<TextBox> for Shape {
    fn from(shape: TextBox) -> Self {
        Shape::TextBox(shape)
    }
}

impl From<Picture> for Shape {
    fn from(shape: Picture) -> Self {
        Shape::Picture(shape)
    }
}

impl From<Connector> for Shape {
    fn from(shape: Connector) -> Self {
        Shape::Connector(shape)
    }
}

impl From<Table> for Shape {
    fn from(shape: Table) -> Self {
        Shape::Table(shape)
    }
}

/// Body placeholder content, moved to an explicit frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub frame: Rect,
    pub text: TextFrame,
}

/// A single slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub layout: Layout,
    pub title: Option<TextFrame>,
    pub subtitle: Option<TextFrame>,
    pub body: Option<Body>,
    pub shapes: Vec<Shape>,
    pub number: Option<usize>,
}

impl Slide {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            title: None,
            subtitle: None,
            body: None,
            shapes: Vec::new(),
            number: None,
        }
    }

    /// Fill the title placeholder.
    pub fn set_title(&mut self, title: TextFrame) {
        self.title = Some(title);
    }

    /// Fill the subtitle placeholder.
    pub fn set_subtitle(&mut self, subtitle: TextFrame) {
        self.subtitle = Some(subtitle);
    }

    /// Fill the body placeholder and move it to `frame`.
    pub fn set_body(&mut self, frame: Rect, text: TextFrame) {
        self.body = Some(Body { frame, text });
    }

    /// Show a page number in the slide-number placeholder.
    pub fn set_slide_number(&mut self, number: usize) {
        self.number = Some(number);
    }

    pub fn add_table(&mut self, rows: usize, cols: usize, frame: Rect) -> &mut Table {
        self.shapes.push(Table::new(rows, cols, frame).into());
        match self.shapes.last_mut() {
            Some(Shape::Table(table)) => table,
            _ => unreachable!("a table was just pushed"),
        }
    }

    pub fn add_shape(&mut self, kind: ShapeKind, frame: Rect) -> &mut AutoShape {
        self.shapes.push(
            AutoShape {
                kind,
                frame,
                fill: Fill::Inherit,
                outline: LineStyle::Inherit,
                no_shadow: false,
                text: TextFrame::new(),
            }
            .into(),
        );
        match self.shapes.last_mut() {
            Some(Shape::Auto(shape)) => shape,
            _ => unreachable!("a shape was just pushed"),
        }
    }

    pub fn add_textbox(&mut self, frame: Rect) -> &mut TextBox {
        self.shapes.push(
            TextBox {
                frame,
                text: TextFrame {
                    word_wrap: false,
                    ..TextFrame::new()
                },
            }
            .into(),
        );
        match self.shapes.last_mut() {
            Some(Shape::TextBox(textbox)) => textbox,
            _ => unreachable!("a text box was just pushed"),
        }
    }

    pub fn add_connector(&mut self, from: Point, to: Point, color: Rgb) {
        self.shapes.push(Connector { from, to, color }.into());
    }

    /// Place a picture read from `path`.
    ///
    /// Without an explicit size the picture keeps its native pixel size at
    /// 96 dpi. The file is read before this returns.
    pub fn add_picture(
        &mut self,
        path: &Path,
        origin: Point,
        size: Option<(Emu, Emu)>,
    ) -> Result<&mut Picture> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Resource(format!("Failed to read picture '{}': {}", path.display(), e))
        })?;
        let media = Media::from_bytes(bytes)
            .map_err(|e| Error::Image(format!("'{}': {}", path.display(), e)))?;

        let (cx, cy) = match size {
            Some(size) => size,
            None => {
                let (w, h) = media.pixel_size().ok_or_else(|| {
                    Error::Image(format!(
                        "Cannot determine the size of picture '{}'",
                        path.display()
                    ))
                })?;
                (Emu::from_pixels(w), Emu::from_pixels(h))
            }
        };

        let description = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.shapes.push(
            Picture {
                frame: Rect::at(origin, cx, cy),
                media,
                description,
                outline: None,
            }
            .into(),
        );
        match self.shapes.last_mut() {
            Some(Shape::Picture(picture)) => Ok(picture),
            _ => unreachable!("a picture was just pushed"),
        }
    }

    /// All visible text on the slide, placeholders first.
    pub fn texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        for frame in [&self.title, &self.subtitle].into_iter().flatten() {
            texts.push(frame.text());
        }
        if let Some(body) = &self.body {
            texts.push(body.text.text());
        }
        for shape in &self.shapes {
            match shape {
                Shape::Auto(s) => texts.push(s.text.text()),
                Shape::TextBox(t) => texts.push(t.text.text()),
                Shape::Table(table) => {
                    for row in 0..table.row_count() {
                        for col in 0..table.column_count() {
                            texts.push(table.cell_text(row, col));
                        }
                    }
                }
                Shape::Picture(_) | Shape::Connector(_) => {}
            }
        }
        texts.retain(|t| !t.is_empty());
        texts
    }
}

/// An ordered sequence of slides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deck {
    title: Option<String>,
    slides: Vec<Slide>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document title recorded in the package properties.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Append a slide with the given layout.
    pub fn new_slide(&mut self, layout: Layout) -> &mut Slide {
        self.slides.push(Slide::new(layout));
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    pub fn last_slide_mut(&mut self) -> Option<&mut Slide> {
        self.slides.last_mut()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Write the deck as a `.pptx` package.
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::writer::PptxWriter::new().save(self, path)
    }
}
