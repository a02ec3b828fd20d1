//! Report generation options.

use std::path::PathBuf;

/// Organization shown on the cover under the report title.
pub const DEFAULT_ORGANIZATION: &str = "BID_PE";

/// Options for [`crate::ReportAssembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Directory the report is saved to; the workbook's directory when unset.
    pub output_dir: Option<PathBuf>,
    /// Directory holding `marker.jpg` and `arrow.png` for the gel pages.
    pub assets_dir: Option<PathBuf>,
    pub organization: String,
    /// Parent of the per-run temporary image directory; the system temp
    /// directory when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            assets_dir: None,
            organization: DEFAULT_ORGANIZATION.to_string(),
            scratch_dir: None,
        }
    }
}

impl ReportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}
