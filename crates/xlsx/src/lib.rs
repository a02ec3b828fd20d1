//! Workbook ingest for purification reports.
//!
//! Reads the three input sheets with every cell as text, except the fixed
//! numeric columns which are reformatted to exactly two decimal places.

pub mod reader;

pub use reader::{Sheet, WorkbookReader};
