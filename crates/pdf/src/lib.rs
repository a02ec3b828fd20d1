//! PDF backend for chromatography picture extraction.
//!
//! PDF reports carry no structured sample labels, so names are recovered
//! from the order of text blocks and paired with image objects by position.
pub mod extractor;
pub use extractor::PdfExtractor;
