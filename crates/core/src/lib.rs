//! Core domain model, derived report views and pagination rules for
//! purification reports.

pub mod error;
pub mod extract;
pub mod labels;
pub mod model;
pub mod paginate;
pub mod types;

pub use error::{Error, Result};
pub use extract::ImageExtractor;
pub use paginate::{Paginator, Placement, Slot, SlotMachine};
pub use types::{
    Attribute, ContainerFormat, EvidenceRow, ExtractedImage, FinalSummary, HplcStepInfo,
    LaneRow, ProcessLineage, ProteinAttributes, ProteinEntry, ProteinPurityByStep,
    PurificationRow, PurityEntry, ReportModel, Run, SdsLane, SdsStepInfo, SdsTable, StepTable,
    Workbook,
};
