//! One builder per report view. Each appends its slides to the deck.

pub mod cover;
pub mod hplc;
pub mod process;
pub mod sds;
pub mod steps;
pub mod style;
pub mod summary;

use std::path::{Path, PathBuf};

/// Locations the evidence pages read from and write to.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Directory relative picture and file references resolve against.
    pub base_dir: &'a Path,
    /// Directory holding the gel page assets.
    pub assets_dir: Option<&'a Path>,
    /// Where extracted pictures are materialised.
    pub scratch_dir: &'a Path,
}

impl<'a> PageContext<'a> {
    pub fn new(base_dir: &'a Path, scratch_dir: &'a Path) -> Self {
        Self {
            base_dir,
            assets_dir: None,
            scratch_dir,
        }
    }

    pub fn with_assets_dir(mut self, assets_dir: Option<&'a Path>) -> Self {
        self.assets_dir = assets_dir;
        self
    }

    /// Resolve a sheet reference against the workbook directory.
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference.trim());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Path of a gel page asset, if it exists.
    pub fn asset(&self, name: &str) -> Option<PathBuf> {
        let Some(dir) = self.assets_dir else {
            log::warn!("No assets directory configured; '{}' is left out", name);
            return None;
        };
        let path = dir.join(name);
        if path.is_file() {
            Some(path)
        } else {
            log::warn!("Asset '{}' not found; it is left out", path.display());
            None
        }
    }
}

/// Whether a picture reference means "no picture for this step".
pub(crate) fn is_missing_reference(reference: &str) -> bool {
    let reference = reference.trim();
    reference.is_empty() || reference == "-"
}
