//! Error types for purification report generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading inputs or building a report.
///
/// Missing keys inside the derived model are not errors: lookups return
/// `Option` and callers fall back to empty values so later pages still render.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// A sheet, column or cell does not have the expected shape, or an
    /// auxiliary file has an unsupported container type.
    #[error("Format error: {0}")]
    Format(String),

    /// A temporary image could not be written or removed.
    #[error("Temporary resource error: {0}")]
    Resource(String),

    /// The spreadsheet backend failed to read the workbook.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// ZIP archive error (for PPTX and DOCX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML reading or writing error (for PPTX and DOCX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// PDF object model error.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Raster image decoding or encoding error.
    #[error("Image error: {0}")]
    Image(String),
}
