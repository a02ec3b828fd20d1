//! The image extraction capability shared by the container backends.

use crate::error::{Error, Result};
use crate::labels::sanitize_file_stem;
use crate::types::ExtractedImage;
use std::path::Path;

/// Pulls the ordered, named sample pictures out of an auxiliary document.
///
/// Each returned image is materialised as a file inside `scratch_dir`; the
/// caller owns that file and removes it once the picture is placed.
pub trait ImageExtractor {
    fn extract(&self, path: &Path, scratch_dir: &Path) -> Result<Vec<ExtractedImage>>;
}

/// Write image bytes to `<scratch_dir>/<sample>.<ext>`.
///
/// The sample name is sanitised for the file system. If two samples share a
/// name, later files get a numeric suffix so no image is overwritten.
pub fn write_scratch_image(
    scratch_dir: &Path,
    sample_name: &str,
    ext: &str,
    bytes: &[u8],
) -> Result<ExtractedImage> {
    let stem = sanitize_file_stem(sample_name);
    let mut path = scratch_dir.join(format!("{}.{}", stem, ext));
    let mut counter = 2;
    while path.exists() {
        path = scratch_dir.join(format!("{}-{}.{}", stem, counter, ext));
        counter += 1;
    }

    std::fs::write(&path, bytes).map_err(|e| {
        Error::Resource(format!("Failed to write image '{}': {}", path.display(), e))
    })?;

    Ok(ExtractedImage {
        name: sample_name.to_string(),
        path,
    })
}

/// Remove a materialised image once it has been placed.
pub fn remove_scratch_image(path: &Path) -> Result<()> {
    std::fs::remove_file(path).map_err(|e| {
        Error::Resource(format!("Failed to remove image '{}': {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_remove_scratch_image() {
        let dir = tempfile::tempdir().unwrap();

        let image = write_scratch_image(dir.path(), "P1", "bin", b"data").unwrap();
        assert_eq!(image.name, "P1");
        assert_eq!(image.path, dir.path().join("P1.bin"));
        assert_eq!(std::fs::read(&image.path).unwrap(), b"data");

        remove_scratch_image(&image.path).unwrap();
        assert!(!image.path.exists());
    }

    #[test]
    fn test_duplicate_names_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();

        let first = write_scratch_image(dir.path(), "a/b", "png", b"1").unwrap();
        let second = write_scratch_image(dir.path(), "a/b", "png", b"2").unwrap();
        assert_eq!(first.path, dir.path().join("a_b.png"));
        assert_eq!(second.path, dir.path().join("a_b-2.png"));
        assert_eq!(second.name, "a/b");
    }

    #[test]
    fn test_remove_missing_image_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = remove_scratch_image(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
    }
}
