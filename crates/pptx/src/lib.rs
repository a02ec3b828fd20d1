//! PPTX (Office Open XML) backend for purification reports.
//!
//! Builders fill an in-memory [`Deck`]; [`PptxWriter`] persists it as a
//! `.pptx` package (a ZIP archive of XML parts) and [`PptxParser`] reads a
//! saved package back as a text outline.

pub mod deck;
pub mod outline;
pub mod parser;
pub mod templates;
pub mod units;
pub mod writer;

pub use deck::{
    Align, Anchor, AutoShape, Deck, Fill, Layout, LineStyle, Paragraph, Picture, Rgb,
    RunStyle, Shape, ShapeKind, Slide, Table, TextBox, TextFrame, TextRun,
};
pub use outline::{Outline, OutlineLine, SlideOutline};
pub use parser::PptxParser;
pub use units::{cm, pt, Emu, FontSize, Point, Rect};
pub use writer::PptxWriter;
