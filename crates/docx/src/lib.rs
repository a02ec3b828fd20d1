//! DOCX (Office Open XML) backend for chromatography picture extraction.
//!
//! Word reports hold one table per sample with a `Sample name:` label and
//! two inline pictures per sample; the second picture is the chromatogram.

pub mod extractor;

pub use extractor::DocxExtractor;
