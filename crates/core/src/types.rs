//! Domain types for the purification workbook and the views derived from it.

use crate::labels::strip_unit_suffix;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the synthetic last step appended to every process lineage.
pub const FINAL_PROCESS_STEP: &str = "Filtration & Storage";

/// Per-protein measurement attributes carried by sheet 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Concentration,
    Volume,
    Amount,
    Yield,
    Buffer,
    PuritySecHplc,
    Recovery,
    Mw,
    Pi,
    Supernatant,
    Comments,
}

impl Attribute {
    /// All attributes in sheet order.
    pub const ALL: [Attribute; 11] = [
        Attribute::Concentration,
        Attribute::Volume,
        Attribute::Amount,
        Attribute::Yield,
        Attribute::Buffer,
        Attribute::PuritySecHplc,
        Attribute::Recovery,
        Attribute::Mw,
        Attribute::Pi,
        Attribute::Supernatant,
        Attribute::Comments,
    ];

    /// The attribute name, i.e. the column label without its unit suffix.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Concentration => "Concentration",
            Attribute::Volume => "Volume",
            Attribute::Amount => "Amount",
            Attribute::Yield => "Yield",
            Attribute::Buffer => "Buffer",
            Attribute::PuritySecHplc => "Purity by SEC-HPLC",
            Attribute::Recovery => "Recovery",
            Attribute::Mw => "MW",
            Attribute::Pi => "PI",
            Attribute::Supernatant => "Supernatant",
            Attribute::Comments => "Comments",
        }
    }

    /// Look up an attribute by its name.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }

    /// Resolve a column label such as `"Volume (ml)"` to its attribute.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::from_key(strip_unit_suffix(label))
    }

    /// Whether ingest parses this column as a number with two decimals.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Attribute::Concentration
                | Attribute::Volume
                | Attribute::Amount
                | Attribute::Yield
                | Attribute::Pi
        )
    }
}

/// Measurement values for one protein at one step. Empty cells are `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinAttributes {
    pub concentration: String,
    pub volume: String,
    pub amount: String,
    pub r#yield: String,
    pub buffer: String,
    pub purity_sec_hplc: String,
    pub recovery: String,
    pub mw: String,
    pub pi: String,
    pub supernatant: String,
    pub comments: String,
}

impl ProteinAttributes {
    /// Get the value of an attribute.
    pub fn get(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::Concentration => &self.concentration,
            Attribute::Volume => &self.volume,
            Attribute::Amount => &self.amount,
            Attribute::Yield => &self.r#yield,
            Attribute::Buffer => &self.buffer,
            Attribute::PuritySecHplc => &self.purity_sec_hplc,
            Attribute::Recovery => &self.recovery,
            Attribute::Mw => &self.mw,
            Attribute::Pi => &self.pi,
            Attribute::Supernatant => &self.supernatant,
            Attribute::Comments => &self.comments,
        }
    }

    /// Set the value of an attribute.
    pub fn set(&mut self, attribute: Attribute, value: impl Into<String>) {
        let slot = match attribute {
            Attribute::Concentration => &mut self.concentration,
            Attribute::Volume => &mut self.volume,
            Attribute::Amount => &mut self.amount,
            Attribute::Yield => &mut self.r#yield,
            Attribute::Buffer => &mut self.buffer,
            Attribute::PuritySecHplc => &mut self.purity_sec_hplc,
            Attribute::Recovery => &mut self.recovery,
            Attribute::Mw => &mut self.mw,
            Attribute::Pi => &mut self.pi,
            Attribute::Supernatant => &mut self.supernatant,
            Attribute::Comments => &mut self.comments,
        };
        *slot = value.into();
    }
}

/// One sheet-1 row: a protein at one purification step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurificationRow {
    pub project_name: String,
    pub date: String,
    pub step_no: String,
    pub step_name: String,
    pub protein_no: String,
    pub protein_name: String,
    pub attributes: ProteinAttributes,
}

/// One sheet-2 row: the gel and chromatography evidence for a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRow {
    pub step_no: String,
    pub step_name: String,
    pub sds_picture: String,
    pub sds_table: String,
    pub sds_eln: String,
    pub sds_conclusion: String,
    pub hplc_picture: String,
    pub hplc_eln: String,
    pub hplc_conclusion: String,
}

/// One sheet-3 row: a gel lane belonging to the lane table named `table`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneRow {
    pub table: String,
    pub lane: String,
    pub protein_name: String,
    pub mw: String,
}

/// The three sheets of an input workbook, as read by ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub purification: Vec<PurificationRow>,
    pub evidence: Vec<EvidenceRow>,
    pub lanes: Vec<LaneRow>,
}

/// Project metadata shown on the cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub project_name: String,
    /// Run date as `MM/DD/YYYY`.
    pub date: String,
}

impl Run {
    /// Date components reordered as `YYYYMMDD`.
    ///
    /// Dates that are not `/`-separated are returned unchanged.
    pub fn compact_date(&self) -> String {
        let parts: Vec<&str> = self.date.split('/').collect();
        match parts.split_last() {
            Some((year, rest)) if !rest.is_empty() => {
                let leading: String = rest.iter().take(2).copied().collect();
                format!("{}{}", year, leading)
            }
            _ => self.date.clone(),
        }
    }
}

/// A protein's number and attributes, as shown in one table row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinEntry {
    pub no: String,
    pub attributes: ProteinAttributes,
}

impl ProteinEntry {
    /// Resolve a table header label to this entry's value.
    ///
    /// The unit suffix is stripped from the label and the remainder is
    /// matched against `No` and the attribute names. Unknown labels
    /// resolve to `""`.
    pub fn lookup(&self, label: &str) -> &str {
        let key = strip_unit_suffix(label);
        if key == "No" {
            return &self.no;
        }
        match Attribute::from_key(key) {
            Some(attribute) => self.attributes.get(attribute),
            None => {
                log::debug!("No attribute for column label '{}'", label);
                ""
            }
        }
    }
}

/// Final state of every protein, keyed by protein name, ordered by number.
pub type FinalSummary = IndexMap<String, ProteinEntry>;

/// Proteins that share one ordered sequence of purification steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLineage {
    /// Protein numbers sharing this lineage, in first-seen order.
    pub protein_nos: Vec<String>,
    /// Step names with consecutive duplicates collapsed.
    pub steps: Vec<String>,
}

impl ProcessLineage {
    /// The label shown in the first box, e.g. `"Protein # 1, 3"`.
    pub fn label(&self) -> String {
        format!("Protein # {}", self.protein_nos.join(", "))
    }

    /// Label, steps and the trailing `Filtration & Storage` step.
    pub fn sequence(&self) -> Vec<String> {
        let mut sequence = Vec::with_capacity(self.steps.len() + 2);
        sequence.push(self.label());
        sequence.extend(self.steps.iter().cloned());
        sequence.push(FINAL_PROCESS_STEP.to_string());
        sequence
    }
}

/// All proteins measured at one step number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTable {
    pub step_no: String,
    /// Distinct step names at this number, joined with `" & "`.
    pub step_name: String,
    pub proteins: IndexMap<String, ProteinEntry>,
}

/// Gel evidence for one step (sheet 2, gel columns).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdsStepInfo {
    pub step_name: String,
    pub picture: String,
    pub table_key: String,
    pub eln: String,
    pub conclusion: String,
}

/// One lane of a gel lane table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdsLane {
    pub lane: String,
    pub protein_name: String,
    pub mw: String,
}

/// A gel lane table in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdsTable {
    pub lanes: Vec<SdsLane>,
}

/// Chromatography evidence for one step (sheet 2, chromatography columns).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HplcStepInfo {
    pub step_no: String,
    pub step_name: String,
    pub picture: String,
    pub eln: String,
    pub conclusion: String,
}

/// A protein's number and SEC-HPLC purity at one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurityEntry {
    pub no: String,
    pub purity: String,
}

impl Default for PurityEntry {
    /// Shown for chromatography samples that do not match a protein name.
    fn default() -> Self {
        Self {
            no: "1".to_string(),
            purity: "100%".to_string(),
        }
    }
}

/// Purity per protein, keyed by [`crate::labels::purity_key`] then protein name.
pub type ProteinPurityByStep = IndexMap<String, IndexMap<String, PurityEntry>>;

/// Every view the page builders need, derived once from a workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportModel {
    pub run: Run,
    /// Supernatant volume (mL) shown at the start of gel flow diagrams.
    pub supernatant: String,
    pub final_summary: FinalSummary,
    pub lineages: Vec<ProcessLineage>,
    pub step_tables: Vec<StepTable>,
    pub sds_steps: Vec<SdsStepInfo>,
    pub sds_tables: IndexMap<String, SdsTable>,
    pub hplc_steps: Vec<HplcStepInfo>,
    pub purity: ProteinPurityByStep,
}

/// An image pulled out of an auxiliary document and stored in a temp file.
///
/// The page builder that places it removes the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Sample name the image belongs to.
    pub name: String,
    /// Location of the materialised image.
    pub path: PathBuf,
}

/// Container formats that hold chromatography pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// Word document (Office Open XML).
    Docx,
    /// PDF report.
    Pdf,
}

impl ContainerFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        // DOCX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Docx);
        }

        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        None
    }
}
