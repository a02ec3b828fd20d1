//! Turns a purification-run workbook into a slide report.
//!
//! [`ReportAssembler`] reads the workbook, derives the report model and runs
//! the page builders in their fixed order: cover, final summary, process,
//! per-step tables, SDS-PAGE and SEC-HPLC.

pub mod assembler;
pub mod extract;
pub mod options;
pub mod pages;

pub use assembler::{number_slides, report_file_name, ReportAssembler};
pub use extract::extractor_for;
pub use options::ReportOptions;
pub use pages::PageContext;
