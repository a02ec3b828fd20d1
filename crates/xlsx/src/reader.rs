//! Workbook reader implementation.

use calamine::{open_workbook_auto, Data, Range, Reader};
use purification_core::labels::strip_unit_suffix;
use purification_core::{
    Attribute, Error, EvidenceRow, LaneRow, PurificationRow, Result, Workbook,
};
use std::path::Path;

/// Sheet-1 identifying columns, in sheet order.
mod columns {
    pub const PROJECT_NAME: &str = "ProjectName";
    pub const DATE: &str = "Date";
    pub const STEP_NO: &str = "PurificationStepNo";
    pub const STEP: &str = "PurificationStep";
    pub const PROTEIN_NO: &str = "ProteinNo";
    pub const PROTEIN_NAME: &str = "ProteinName";

    pub const SDS_PICTURE: &str = "SDS_Picture";
    pub const SDS_TABLE: &str = "SDS_Table";
    pub const SDS_ELN: &str = "SDS_ELN";
    pub const SDS_CONCLUSION: &str = "SDS_Conclusion";
    pub const HPLC_PICTURE: &str = "HPLC_Picture";
    pub const HPLC_ELN: &str = "HPLC_ELN";
    pub const HPLC_CONCLUSION: &str = "HPLC_Conclusion";

    pub const TABLE: &str = "Table";
    pub const LANE: &str = "Lane";
    pub const LANE_PROTEIN_NAME: &str = "Protein name";
    pub const MW: &str = "MW";
}

/// Number of sheets an input workbook must have.
const SHEET_COUNT: usize = 3;

/// A sheet as text: a header row and the data rows below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    /// Position of the sheet in the workbook (1-based), for messages.
    pub number: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Create a sheet from already-stringified cells.
    pub fn new(number: usize, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            number,
            headers,
            rows,
        }
    }

    /// Convert a calamine range. The first row is the header row; rows with
    /// no content at all are dropped.
    pub fn from_range(number: usize, range: &Range<Data>) -> Self {
        let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

        let headers = rows
            .next()
            .map(|h| h.into_iter().map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();
        let rows = rows
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Self::new(number, headers, rows)
    }

    /// Find a column by its label, ignoring unit suffixes on both sides.
    pub fn column(&self, label: &str) -> Result<usize> {
        let wanted = strip_unit_suffix(label);
        self.headers
            .iter()
            .position(|h| strip_unit_suffix(h) == wanted)
            .ok_or_else(|| {
                Error::Format(format!(
                    "Sheet {} is missing the '{}' column",
                    self.number, label
                ))
            })
    }

    /// Cell text, or `""` for cells past the end of a short row.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// Render a cell as text without type inference beyond what the cell holds.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%m/%d/%Y").to_string())
            .unwrap_or_else(|| format_float(dt.as_f64())),
        other => other.to_string(),
    }
}

/// Integral values print without a decimal part (`3`, not `3.0`).
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Parse a numeric cell and reformat it with two decimals.
///
/// Empty cells stay empty.
pub fn format_two_decimals(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(String::new());
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(format!("{:.2}", value)),
        _ => None,
    }
}

/// Reader for purification workbooks.
pub struct WorkbookReader;

impl WorkbookReader {
    /// Create a new workbook reader.
    pub fn new() -> Self {
        Self
    }

    /// Read the three sheets of a workbook file.
    pub fn read(&self, path: &Path) -> Result<Workbook> {
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            Error::Workbook(format!("Failed to open '{}': {}", path.display(), e))
        })?;

        let mut sheets = Vec::with_capacity(SHEET_COUNT);
        for index in 0..SHEET_COUNT {
            let range = workbook
                .worksheet_range_at(index)
                .ok_or_else(|| {
                    Error::Format(format!(
                        "Workbook '{}' has no sheet {} (expected {} sheets)",
                        path.display(),
                        index + 1,
                        SHEET_COUNT
                    ))
                })?
                .map_err(|e| Error::Workbook(format!("Failed to read sheet {}: {}", index + 1, e)))?;
            sheets.push(Sheet::from_range(index + 1, &range));
        }

        log::info!(
            "Read workbook '{}': {} purification rows, {} evidence rows, {} lane rows",
            path.display(),
            sheets[0].rows.len(),
            sheets[1].rows.len(),
            sheets[2].rows.len()
        );

        self.from_sheets(&sheets[0], &sheets[1], &sheets[2])
    }

    /// Build the workbook records from text sheets.
    pub fn from_sheets(&self, purification: &Sheet, evidence: &Sheet, lanes: &Sheet) -> Result<Workbook> {
        Ok(Workbook {
            purification: self.parse_purification(purification)?,
            evidence: self.parse_evidence(evidence)?,
            lanes: self.parse_lanes(lanes)?,
        })
    }

    /// Sheet 1: one row per protein per step.
    fn parse_purification(&self, sheet: &Sheet) -> Result<Vec<PurificationRow>> {
        let project_name = sheet.column(columns::PROJECT_NAME)?;
        let date = sheet.column(columns::DATE)?;
        let step_no = sheet.column(columns::STEP_NO)?;
        let step = sheet.column(columns::STEP)?;
        let protein_no = sheet.column(columns::PROTEIN_NO)?;
        let protein_name = sheet.column(columns::PROTEIN_NAME)?;

        let attribute_columns = Attribute::ALL
            .iter()
            .map(|&attribute| Ok((attribute, sheet.column(attribute.key())?)))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(sheet.rows.len());
        for index in 0..sheet.rows.len() {
            let mut row = PurificationRow {
                project_name: sheet.cell(index, project_name).to_string(),
                date: sheet.cell(index, date).to_string(),
                step_no: sheet.cell(index, step_no).to_string(),
                step_name: sheet.cell(index, step).to_string(),
                protein_no: sheet.cell(index, protein_no).to_string(),
                protein_name: sheet.cell(index, protein_name).to_string(),
                ..Default::default()
            };

            for &(attribute, column) in &attribute_columns {
                let raw = sheet.cell(index, column);
                let value = if attribute.is_numeric() {
                    format_two_decimals(raw).ok_or_else(|| {
                        Error::Format(format!(
                            "Sheet {} row {}: '{}' is not a number in column '{}'",
                            sheet.number,
                            index + 2,
                            raw,
                            sheet.headers[column]
                        ))
                    })?
                } else {
                    raw.to_string()
                };
                row.attributes.set(attribute, value);
            }

            rows.push(row);
        }

        Ok(rows)
    }

    /// Sheet 2: gel and chromatography evidence per step.
    fn parse_evidence(&self, sheet: &Sheet) -> Result<Vec<EvidenceRow>> {
        let step_no = sheet.column(columns::STEP_NO)?;
        let step = sheet.column(columns::STEP)?;
        let sds_picture = sheet.column(columns::SDS_PICTURE)?;
        let sds_table = sheet.column(columns::SDS_TABLE)?;
        let sds_eln = sheet.column(columns::SDS_ELN)?;
        let sds_conclusion = sheet.column(columns::SDS_CONCLUSION)?;
        let hplc_picture = sheet.column(columns::HPLC_PICTURE)?;
        let hplc_eln = sheet.column(columns::HPLC_ELN)?;
        let hplc_conclusion = sheet.column(columns::HPLC_CONCLUSION)?;

        Ok((0..sheet.rows.len())
            .map(|index| EvidenceRow {
                step_no: sheet.cell(index, step_no).to_string(),
                step_name: sheet.cell(index, step).to_string(),
                sds_picture: sheet.cell(index, sds_picture).to_string(),
                sds_table: sheet.cell(index, sds_table).to_string(),
                sds_eln: sheet.cell(index, sds_eln).to_string(),
                sds_conclusion: sheet.cell(index, sds_conclusion).to_string(),
                hplc_picture: sheet.cell(index, hplc_picture).to_string(),
                hplc_eln: sheet.cell(index, hplc_eln).to_string(),
                hplc_conclusion: sheet.cell(index, hplc_conclusion).to_string(),
            })
            .collect())
    }

    /// Sheet 3: gel lanes, grouped later by their `Table` column.
    fn parse_lanes(&self, sheet: &Sheet) -> Result<Vec<LaneRow>> {
        let table = sheet.column(columns::TABLE)?;
        let lane = sheet.column(columns::LANE)?;
        let protein_name = sheet.column(columns::LANE_PROTEIN_NAME)?;
        let mw = sheet.column(columns::MW)?;

        Ok((0..sheet.rows.len())
            .map(|index| LaneRow {
                table: sheet.cell(index, table).to_string(),
                lane: sheet.cell(index, lane).to_string(),
                protein_name: sheet.cell(index, protein_name).to_string(),
                mw: sheet.cell(index, mw).to_string(),
            })
            .collect())
    }
}

impl Default for WorkbookReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PURIFICATION_HEADERS: [&str; 17] = [
        "ProjectName",
        "Date",
        "PurificationStepNo",
        "PurificationStep",
        "ProteinNo",
        "ProteinName",
        "Concentration (mg/ml)",
        "Volume (ml)",
        "Amount (mg)",
        "Yield (mg/L)",
        "Buffer",
        "Purity by SEC-HPLC (%)",
        "Recovery (%)",
        "MW (kDa)",
        "PI",
        "Supernatant (mL)",
        "Comments",
    ];

    const EVIDENCE_HEADERS: [&str; 9] = [
        "PurificationStepNo",
        "PurificationStep",
        "SDS_Picture",
        "SDS_Table",
        "SDS_ELN",
        "SDS_Conclusion",
        "HPLC_Picture",
        "HPLC_ELN",
        "HPLC_Conclusion",
    ];

    const LANE_HEADERS: [&str; 4] = ["Table", "Lane", "Protein name", "MW(kDa)"];

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn purification_sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            1,
            strings(&PURIFICATION_HEADERS),
            rows.iter().map(|r| strings(r)).collect(),
        )
    }

    fn empty_sheet(number: usize, headers: &[&str]) -> Sheet {
        Sheet::new(number, strings(headers), Vec::new())
    }

    #[test]
    fn test_format_two_decimals() {
        assert_eq!(format_two_decimals("1.5"), Some("1.50".to_string()));
        assert_eq!(format_two_decimals(" 2 "), Some("2.00".to_string()));
        assert_eq!(format_two_decimals("0.125"), Some("0.12".to_string()));
        assert_eq!(format_two_decimals("-3.456"), Some("-3.46".to_string()));
        assert_eq!(format_two_decimals(""), Some(String::new()));
        assert_eq!(format_two_decimals("abc"), None);
        assert_eq!(format_two_decimals("NaN"), None);
        assert_eq!(format_two_decimals("inf"), None);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-12.0), "-12");
    }

    #[test]
    fn test_parse_purification_rows() {
        let sheet = purification_sheet(&[&[
            "WBP1", "04/13/2020", "1", "Protein A", "1", "P1", "0.3", "1.5", "", "12.056",
            "PBS", "99.62%", "NA", "147", "6.3", "40", "Three steps",
        ]]);
        let reader = WorkbookReader::new();
        let workbook = reader
            .from_sheets(
                &sheet,
                &empty_sheet(2, &EVIDENCE_HEADERS),
                &empty_sheet(3, &LANE_HEADERS),
            )
            .unwrap();

        let row = &workbook.purification[0];
        assert_eq!(row.project_name, "WBP1");
        assert_eq!(row.step_name, "Protein A");
        assert_eq!(row.attributes.concentration, "0.30");
        assert_eq!(row.attributes.volume, "1.50");
        assert_eq!(row.attributes.amount, "");
        assert_eq!(row.attributes.r#yield, "12.06");
        assert_eq!(row.attributes.pi, "6.30");
        assert_eq!(row.attributes.purity_sec_hplc, "99.62%");
        assert_eq!(row.attributes.mw, "147");
        assert_eq!(row.attributes.supernatant, "40");
        assert_eq!(row.attributes.comments, "Three steps");
    }

    #[test]
    fn test_numeric_columns_match_two_decimal_pattern() {
        let values = ["1", "2.5", "-0.004", "", "1000000", "0.999"];
        for value in values {
            let sheet = purification_sheet(&[&[
                "WBP1", "d", "1", "s", "1", "P", value, value, value, value, "", "", "", "", value,
                "", "",
            ]]);
            let workbook = WorkbookReader::new()
                .from_sheets(
                    &sheet,
                    &empty_sheet(2, &EVIDENCE_HEADERS),
                    &empty_sheet(3, &LANE_HEADERS),
                )
                .unwrap();
            let attributes = &workbook.purification[0].attributes;
            for attribute in Attribute::ALL.iter().filter(|a| a.is_numeric()) {
                let text = attributes.get(*attribute);
                let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
                let whole = whole.strip_prefix('-').unwrap_or(whole);
                assert!(
                    text.is_empty()
                        || (!whole.is_empty()
                            && whole.chars().all(|c| c.is_ascii_digit())
                            && fraction.len() == 2
                            && fraction.chars().all(|c| c.is_ascii_digit())),
                    "unexpected numeric text '{}'",
                    text
                );
            }
        }
    }

    #[test]
    fn test_non_numeric_value_is_format_error() {
        let sheet = purification_sheet(&[&[
            "WBP1", "d", "1", "s", "1", "P", "lots", "", "", "", "", "", "", "", "", "", "",
        ]]);
        let err = WorkbookReader::new()
            .from_sheets(
                &sheet,
                &empty_sheet(2, &EVIDENCE_HEADERS),
                &empty_sheet(3, &LANE_HEADERS),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("Concentration (mg/ml)"));
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let sheet = Sheet::new(1, strings(&["ProjectName", "Date"]), Vec::new());
        let err = WorkbookReader::new()
            .from_sheets(
                &sheet,
                &empty_sheet(2, &EVIDENCE_HEADERS),
                &empty_sheet(3, &LANE_HEADERS),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("PurificationStepNo"));
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let sheet = purification_sheet(&[&["WBP1", "04/13/2020", "1"]]);
        let workbook = WorkbookReader::new()
            .from_sheets(
                &sheet,
                &empty_sheet(2, &EVIDENCE_HEADERS),
                &empty_sheet(3, &LANE_HEADERS),
            )
            .unwrap();
        assert_eq!(workbook.purification[0].protein_name, "");
        assert_eq!(workbook.purification[0].attributes.concentration, "");
    }

    #[test]
    fn test_parse_evidence_and_lanes() {
        let evidence = Sheet::new(
            2,
            strings(&EVIDENCE_HEADERS),
            vec![strings(&[
                "1", "Protein A", "gel.png", "SEC", "ELN-1", "A.|B.", "hplc.pdf", "ELN-2", "C.",
            ])],
        );
        let lanes = Sheet::new(
            3,
            strings(&LANE_HEADERS),
            vec![strings(&["SEC", "1", "P1", "147"])],
        );
        let workbook = WorkbookReader::new()
            .from_sheets(&purification_sheet(&[]), &evidence, &lanes)
            .unwrap();

        let row = &workbook.evidence[0];
        assert_eq!(row.sds_table, "SEC");
        assert_eq!(row.sds_conclusion, "A.|B.");
        assert_eq!(row.hplc_picture, "hplc.pdf");
        assert_eq!(workbook.lanes[0].mw, "147");
    }

    #[test]
    fn test_read_workbook_file() {
        use rust_xlsxwriter::Workbook as XlsxWorkbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.xlsx");

        let mut xlsx = XlsxWorkbook::new();
        let sheet = xlsx.add_worksheet();
        for (col, header) in PURIFICATION_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "WBP9").unwrap();
        sheet.write_string(1, 1, "05/06/2021").unwrap();
        sheet.write_number(1, 2, 1.0).unwrap();
        sheet.write_string(1, 3, "Protein A").unwrap();
        sheet.write_number(1, 4, 2.0).unwrap();
        sheet.write_string(1, 5, "P2").unwrap();
        sheet.write_number(1, 6, 0.456).unwrap();
        sheet.write_number(1, 15, 40.0).unwrap();

        let sheet = xlsx.add_worksheet();
        for (col, header) in EVIDENCE_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        let sheet = xlsx.add_worksheet();
        for (col, header) in LANE_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "SEC").unwrap();
        sheet.write_number(1, 1, 1.0).unwrap();
        sheet.write_string(1, 2, "P2").unwrap();
        sheet.write_number(1, 3, 147.0).unwrap();
        xlsx.save(&path).unwrap();

        let workbook = WorkbookReader::new().read(&path).unwrap();

        assert_eq!(workbook.purification.len(), 1);
        let row = &workbook.purification[0];
        assert_eq!(row.project_name, "WBP9");
        assert_eq!(row.step_no, "1");
        assert_eq!(row.protein_no, "2");
        assert_eq!(row.attributes.concentration, "0.46");
        assert_eq!(row.attributes.supernatant, "40");
        assert!(workbook.evidence.is_empty());
        assert_eq!(workbook.lanes[0].lane, "1");
        assert_eq!(workbook.lanes[0].mw, "147");
    }

    #[test]
    fn test_missing_sheet_is_format_error() {
        use rust_xlsxwriter::Workbook as XlsxWorkbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one-sheet.xlsx");
        let mut xlsx = XlsxWorkbook::new();
        xlsx.add_worksheet().write_string(0, 0, "ProjectName").unwrap();
        xlsx.save(&path).unwrap();

        let err = WorkbookReader::new().read(&path).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
