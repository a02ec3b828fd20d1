//! Chooses the picture extractor for a chromatography file.

use purification_core::{ContainerFormat, Error, ImageExtractor, Result};
use purification_docx::DocxExtractor;
use purification_pdf::PdfExtractor;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Format named by the first bytes of the file, if it can be read.
fn sniff(path: &Path) -> Option<ContainerFormat> {
    let mut magic = [0u8; 8];
    let read = File::open(path).and_then(|mut f| f.read(&mut magic)).ok()?;
    ContainerFormat::from_magic(&magic[..read])
}

/// Pick the extractor by file extension (case-insensitive).
pub fn extractor_for(path: &Path) -> Result<Box<dyn ImageExtractor>> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ContainerFormat::from_extension)
        .ok_or_else(|| {
            Error::Format(format!(
                "Chromatography file '{}' must be docx or pdf",
                path.display()
            ))
        })?;

    if let Some(actual) = sniff(path).filter(|actual| *actual != format) {
        log::warn!(
            "'{}' looks like {:?} content; reading it as {:?} by its extension",
            path.display(),
            actual,
            format
        );
    }

    log::debug!("Using {:?} extractor for '{}'", format, path.display());
    Ok(match format {
        ContainerFormat::Docx => Box::new(DocxExtractor::new()),
        ContainerFormat::Pdf => Box::new(PdfExtractor::new()),
    })
}
