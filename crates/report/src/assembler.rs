//! Report assembly: workbook in, `.pptx` out.

use crate::options::ReportOptions;
use crate::pages::cover::build_cover;
use crate::pages::hplc::build_hplc;
use crate::pages::process::build_process;
use crate::pages::sds::build_sds;
use crate::pages::steps::build_steps;
use crate::pages::summary::build_summary;
use crate::pages::PageContext;
use purification_core::labels::sanitize_file_stem;
use purification_core::{ReportModel, Result, Run};
use purification_pptx::Deck;
use purification_xlsx::WorkbookReader;
use std::path::{Path, PathBuf};

/// Prefix of the per-run directory extracted pictures are written to.
const SCRATCH_PREFIX: &str = "purification-images";

/// `YYYYMMDD <project> Purification report.pptx`.
pub fn report_file_name(run: &Run) -> String {
    format!(
        "{} {} Purification report.pptx",
        run.compact_date(),
        sanitize_file_stem(&run.project_name)
    )
}

/// Number every slide after the cover with its position plus one.
pub fn number_slides(deck: &mut Deck) {
    for (index, slide) in deck.slides_mut().iter_mut().enumerate().skip(1) {
        slide.set_slide_number(index + 1);
    }
}

/// Builds a purification report from a workbook.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    options: ReportOptions,
}

impl ReportAssembler {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Read `workbook_path`, build the report and save it. Returns the path
    /// of the written file.
    pub fn generate(&self, workbook_path: &Path) -> Result<PathBuf> {
        let workbook = WorkbookReader::new().read(workbook_path)?;
        let model = ReportModel::from_workbook(&workbook);

        let base_dir = workbook_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let deck = self.build_deck(&model, &base_dir)?;

        let output_dir = self.options.output_dir.clone().unwrap_or(base_dir);
        let output = output_dir.join(report_file_name(&model.run));
        deck.save(&output)?;

        log::info!(
            "Saved {} slides for '{}' to '{}'",
            deck.len(),
            model.run.project_name,
            output.display()
        );
        Ok(output)
    }

    /// Run every page builder in report order. Sheet references resolve
    /// against `base_dir`.
    pub fn build_deck(&self, model: &ReportModel, base_dir: &Path) -> Result<Deck> {
        let scratch_parent = self
            .options
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&scratch_parent)?;
        let context = PageContext::new(base_dir, scratch.path())
            .with_assets_dir(self.options.assets_dir.as_deref());

        let mut deck =
            Deck::new().with_title(format!("{} Purification Report", model.run.project_name));

        build_cover(&mut deck, &model.run, &self.options.organization);
        build_summary(&mut deck, &model.final_summary);
        build_process(&mut deck, &model.lineages);
        build_steps(&mut deck, &model.step_tables);
        build_sds(&mut deck, model, &context)?;
        build_hplc(&mut deck, model, &context)?;
        number_slides(&mut deck);

        log::debug!(
            "Built {} slides ({} steps, {} gel steps, {} chromatography steps)",
            deck.len(),
            model.step_tables.len(),
            model.sds_steps.len(),
            model.hplc_steps.len()
        );
        Ok(deck)
    }
}
