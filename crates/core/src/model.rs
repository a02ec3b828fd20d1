//! Derivation of the report views from the raw workbook sheets.
//!
//! Every view is built once here and handed read-only to the page builders.
//! A required column that is blank in every row yields an empty view instead
//! of an error, so the corresponding pages are simply not emitted.

use crate::labels::{natural_cmp, purity_key};
use crate::types::{
    EvidenceRow, FinalSummary, HplcStepInfo, LaneRow, ProcessLineage, ProteinEntry,
    ProteinPurityByStep, PurificationRow, PurityEntry, ReportModel, Run, SdsLane, SdsStepInfo,
    SdsTable, StepTable, Workbook,
};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Project name used when sheet 1 has no rows.
pub const DEFAULT_PROJECT_NAME: &str = "project";

/// Supernatant volume used when sheet 1 has no rows.
pub const DEFAULT_SUPERNATANT: &str = "0";

impl ReportModel {
    /// Derive every report view from a workbook, using today's date when the
    /// workbook carries no rows.
    pub fn from_workbook(workbook: &Workbook) -> Self {
        let today = chrono::Local::now().format("%m/%d/%Y").to_string();
        Self::from_workbook_with_date(workbook, &today)
    }

    /// Derive every report view, with an explicit fallback run date.
    pub fn from_workbook_with_date(workbook: &Workbook, fallback_date: &str) -> Self {
        let rows = &workbook.purification;

        let model = Self {
            run: derive_run(rows, fallback_date),
            supernatant: rows
                .first()
                .map(|r| r.attributes.supernatant.clone())
                .unwrap_or_else(|| DEFAULT_SUPERNATANT.to_string()),
            final_summary: derive_final_summary(rows),
            lineages: derive_lineages(rows),
            step_tables: derive_step_tables(rows),
            sds_steps: derive_sds_steps(&workbook.evidence),
            sds_tables: derive_sds_tables(&workbook.lanes),
            hplc_steps: derive_hplc_steps(&workbook.evidence),
            purity: derive_purity(rows),
        };

        log::debug!(
            "Derived model: {} proteins, {} lineages, {} steps, {} gel steps, {} lane tables, {} chromatography steps",
            model.final_summary.len(),
            model.lineages.len(),
            model.step_tables.len(),
            model.sds_steps.len(),
            model.sds_tables.len(),
            model.hplc_steps.len()
        );

        model
    }
}

fn column_is_blank(rows: &[PurificationRow], column: impl Fn(&PurificationRow) -> &str) -> bool {
    rows.iter().all(|r| column(r).trim().is_empty())
}

fn protein_entry(row: &PurificationRow) -> ProteinEntry {
    ProteinEntry {
        no: row.protein_no.clone(),
        attributes: row.attributes.clone(),
    }
}

/// Run metadata comes from the first row.
pub fn derive_run(rows: &[PurificationRow], fallback_date: &str) -> Run {
    match rows.first() {
        Some(first) => Run {
            project_name: first.project_name.clone(),
            date: first.date.clone(),
        },
        None => Run {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            date: fallback_date.to_string(),
        },
    }
}

/// One entry per protein name, taken from the row with that protein's
/// highest step number, ordered by protein number.
///
/// When several rows share a protein's highest step, the last one in sheet
/// order wins.
pub fn derive_final_summary(rows: &[PurificationRow]) -> FinalSummary {
    let mut summary = FinalSummary::new();
    if column_is_blank(rows, |r| r.step_no.as_str())
        || column_is_blank(rows, |r| r.protein_name.as_str())
    {
        return summary;
    }

    let mut last_step: BTreeMap<&str, &str> = BTreeMap::new();
    for row in rows {
        let current = last_step
            .entry(row.protein_name.as_str())
            .or_insert(row.step_no.as_str());
        if natural_cmp(&row.step_no, *current) == Ordering::Greater {
            *current = row.step_no.as_str();
        }
    }

    let mut finals: Vec<&PurificationRow> = last_step
        .iter()
        .flat_map(|(name, step)| {
            rows.iter()
                .filter(move |r| r.protein_name == *name && r.step_no == *step)
        })
        .collect();
    finals.sort_by(|a, b| natural_cmp(&a.protein_no, &b.protein_no));

    for row in finals {
        summary.insert(row.protein_name.clone(), protein_entry(row));
    }

    summary
}

/// Group protein numbers by their ordered, duplicate-collapsed step sequence.
pub fn derive_lineages(rows: &[PurificationRow]) -> Vec<ProcessLineage> {
    if column_is_blank(rows, |r| r.protein_no.as_str()) {
        return Vec::new();
    }

    let mut visited: IndexMap<&str, Vec<String>> = IndexMap::new();
    for row in rows {
        visited
            .entry(row.protein_no.as_str())
            .or_default()
            .push(row.step_name.clone());
    }

    let mut groups: IndexMap<Vec<String>, Vec<String>> = IndexMap::new();
    for (protein_no, mut steps) in visited {
        steps.dedup();
        groups.entry(steps).or_default().push(protein_no.to_string());
    }

    groups
        .into_iter()
        .map(|(steps, protein_nos)| ProcessLineage { protein_nos, steps })
        .collect()
}

/// Group rows by step number, in first-seen order.
fn group_by_step(rows: &[PurificationRow]) -> IndexMap<&str, Vec<&PurificationRow>> {
    let mut groups: IndexMap<&str, Vec<&PurificationRow>> = IndexMap::new();
    for row in rows {
        groups.entry(row.step_no.as_str()).or_default().push(row);
    }
    groups
}

/// Distinct step names of a group joined with `" & "`.
fn joined_step_name(rows: &[&PurificationRow]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for row in rows {
        if !names.contains(&row.step_name.as_str()) {
            names.push(&row.step_name);
        }
    }
    names.join(" & ")
}

/// One table per step number, proteins in sheet order.
pub fn derive_step_tables(rows: &[PurificationRow]) -> Vec<StepTable> {
    if column_is_blank(rows, |r| r.step_no.as_str()) {
        return Vec::new();
    }

    group_by_step(rows)
        .into_iter()
        .map(|(step_no, group)| {
            let mut proteins = IndexMap::new();
            for row in &group {
                proteins.insert(row.protein_name.clone(), protein_entry(row));
            }
            StepTable {
                step_no: step_no.to_string(),
                step_name: joined_step_name(&group),
                proteins,
            }
        })
        .collect()
}

/// Purity per protein per step, keyed for the chromatography join.
pub fn derive_purity(rows: &[PurificationRow]) -> ProteinPurityByStep {
    let mut purity = ProteinPurityByStep::new();
    if column_is_blank(rows, |r| r.step_no.as_str()) {
        return purity;
    }

    for (step_no, group) in group_by_step(rows) {
        let key = purity_key(step_no, &joined_step_name(&group));
        let proteins = purity.entry(key).or_default();
        for row in group {
            proteins.insert(
                row.protein_name.clone(),
                PurityEntry {
                    no: row.protein_no.clone(),
                    purity: row.attributes.purity_sec_hplc.clone(),
                },
            );
        }
    }

    purity
}

pub fn derive_sds_steps(evidence: &[EvidenceRow]) -> Vec<SdsStepInfo> {
    evidence
        .iter()
        .map(|row| SdsStepInfo {
            step_name: row.step_name.clone(),
            picture: row.sds_picture.clone(),
            table_key: row.sds_table.clone(),
            eln: row.sds_eln.clone(),
            conclusion: row.sds_conclusion.clone(),
        })
        .collect()
}

/// Append each lane to the table named by its `Table` column.
pub fn derive_sds_tables(lanes: &[LaneRow]) -> IndexMap<String, SdsTable> {
    let mut tables: IndexMap<String, SdsTable> = IndexMap::new();
    for row in lanes {
        tables
            .entry(row.table.clone())
            .or_default()
            .lanes
            .push(SdsLane {
                lane: row.lane.clone(),
                protein_name: row.protein_name.clone(),
                mw: row.mw.clone(),
            });
    }
    tables
}

pub fn derive_hplc_steps(evidence: &[EvidenceRow]) -> Vec<HplcStepInfo> {
    evidence
        .iter()
        .map(|row| HplcStepInfo {
            step_no: row.step_no.clone(),
            step_name: row.step_name.clone(),
            picture: row.hplc_picture.clone(),
            eln: row.hplc_eln.clone(),
            conclusion: row.hplc_conclusion.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attribute;

    fn row(step_no: &str, step: &str, protein_no: &str, protein: &str) -> PurificationRow {
        let mut row = PurificationRow {
            project_name: "WBP123".to_string(),
            date: "04/13/2020".to_string(),
            step_no: step_no.to_string(),
            step_name: step.to_string(),
            protein_no: protein_no.to_string(),
            protein_name: protein.to_string(),
            ..Default::default()
        };
        row.attributes
            .set(Attribute::PuritySecHplc, format!("{}-{}%", protein, step_no));
        row.attributes.set(Attribute::Supernatant, "40");
        row
    }

    fn sample_rows() -> Vec<PurificationRow> {
        vec![
            row("1", "Protein A", "1", "P1"),
            row("1", "Protein A", "2", "P2"),
            row("2", "Dialysis", "1", "P1"),
            row("2", "Dialysis", "2", "P2"),
            row("3", "SEC", "1", "P1"),
        ]
    }

    #[test]
    fn test_run_from_first_row() {
        let run = derive_run(&sample_rows(), "01/01/2000");
        assert_eq!(run.project_name, "WBP123");
        assert_eq!(run.date, "04/13/2020");
    }

    #[test]
    fn test_run_defaults_when_empty() {
        let run = derive_run(&[], "01/02/2003");
        assert_eq!(run.project_name, "project");
        assert_eq!(run.date, "01/02/2003");
    }

    #[test]
    fn test_final_summary_takes_highest_step() {
        let summary = derive_final_summary(&sample_rows());

        assert_eq!(summary.len(), 2);
        let names: Vec<&str> = summary.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2"]);
        assert_eq!(summary["P1"].attributes.purity_sec_hplc, "P1-3%");
        assert_eq!(summary["P2"].attributes.purity_sec_hplc, "P2-2%");
        assert_eq!(summary["P2"].no, "2");
    }

    #[test]
    fn test_final_summary_orders_by_protein_number() {
        let rows = vec![
            row("1", "Protein A", "10", "Z"),
            row("1", "Protein A", "9", "Y"),
            row("1", "Protein A", "2", "A"),
        ];
        let summary = derive_final_summary(&rows);
        let names: Vec<&str> = summary.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["A", "Y", "Z"]);
    }

    #[test]
    fn test_final_summary_numeric_step_comparison() {
        let rows = vec![
            row("9", "Dialysis", "1", "P1"),
            row("10", "SEC", "1", "P1"),
        ];
        let summary = derive_final_summary(&rows);
        assert_eq!(summary["P1"].attributes.purity_sec_hplc, "P1-10%");
    }

    #[test]
    fn test_final_summary_last_tie_wins() {
        let mut first = row("2", "SEC", "1", "P1");
        first.attributes.set(Attribute::Comments, "first");
        let mut second = row("2", "SEC", "1", "P1");
        second.attributes.set(Attribute::Comments, "second");

        let summary = derive_final_summary(&[row("1", "Protein A", "1", "P1"), first, second]);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary["P1"].attributes.comments, "second");
    }

    #[test]
    fn test_lineages_group_matching_sequences() {
        let lineages = derive_lineages(&sample_rows());

        assert_eq!(lineages.len(), 2);
        assert_eq!(lineages[0].protein_nos, vec!["1"]);
        assert_eq!(lineages[0].steps, vec!["Protein A", "Dialysis", "SEC"]);
        assert_eq!(lineages[1].protein_nos, vec!["2"]);
        assert_eq!(lineages[1].steps, vec!["Protein A", "Dialysis"]);
    }

    #[test]
    fn test_lineages_collapse_consecutive_duplicates() {
        let rows = vec![
            row("1", "Protein A", "1", "P1"),
            row("2", "Dialysis", "1", "P1"),
            row("3", "Dialysis", "1", "P1"),
            row("4", "SEC", "1", "P1"),
            row("5", "Dialysis", "1", "P1"),
            row("1", "Protein A", "2", "P2"),
            row("2", "Dialysis", "2", "P2"),
            row("3", "SEC", "2", "P2"),
            row("4", "Dialysis", "2", "P2"),
        ];
        let lineages = derive_lineages(&rows);

        assert_eq!(lineages.len(), 1);
        assert_eq!(lineages[0].label(), "Protein # 1, 2");
        assert_eq!(
            lineages[0].steps,
            vec!["Protein A", "Dialysis", "SEC", "Dialysis"]
        );
    }

    #[test]
    fn test_lineages_share_protein_number() {
        let rows = vec![
            row("1", "Ni", "1", "P1"),
            row("1", "Ni", "1", "P2"),
            row("2", "SEC", "1", "P1"),
        ];
        let lineages = derive_lineages(&rows);
        assert_eq!(lineages.len(), 1);
        assert_eq!(lineages[0].protein_nos, vec!["1"]);
        assert_eq!(lineages[0].steps, vec!["Ni", "SEC"]);
    }

    #[test]
    fn test_step_tables_join_names() {
        let rows = vec![
            row("1", "Protein A", "1", "P1"),
            row("1", "Ni", "2", "P2"),
            row("2", "Dialysis", "1", "P1"),
        ];
        let tables = derive_step_tables(&rows);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].step_no, "1");
        assert_eq!(tables[0].step_name, "Protein A & Ni");
        let proteins: Vec<&str> = tables[0].proteins.keys().map(|k| k.as_str()).collect();
        assert_eq!(proteins, vec!["P1", "P2"]);
        assert_eq!(tables[1].step_name, "Dialysis");
        assert_eq!(tables[1].proteins.len(), 1);
    }

    #[test]
    fn test_purity_keys_match_chromatography_join() {
        let purity = derive_purity(&sample_rows());

        let entry = &purity[&purity_key("1", "Protein A")]["P2"];
        assert_eq!(entry.no, "2");
        assert_eq!(entry.purity, "P2-1%");
        assert!(purity.contains_key("3_SEC"));
    }

    #[test]
    fn test_blank_step_column_degrades_to_empty_views() {
        let rows = vec![row("", "Protein A", "1", "P1"), row("", "SEC", "1", "P1")];
        assert!(derive_final_summary(&rows).is_empty());
        assert!(derive_step_tables(&rows).is_empty());
        assert!(derive_purity(&rows).is_empty());
        assert_eq!(derive_lineages(&rows).len(), 1);
    }

    #[test]
    fn test_sds_tables_append_by_key() {
        let lanes = vec![
            LaneRow {
                table: "SEC".to_string(),
                lane: "1".to_string(),
                protein_name: "P1".to_string(),
                mw: "147".to_string(),
            },
            LaneRow {
                table: "CEX".to_string(),
                lane: "1".to_string(),
                protein_name: "P2".to_string(),
                mw: "148".to_string(),
            },
            LaneRow {
                table: "SEC".to_string(),
                lane: "2".to_string(),
                protein_name: "P2".to_string(),
                mw: "22+53".to_string(),
            },
        ];
        let tables = derive_sds_tables(&lanes);

        assert_eq!(tables.len(), 2);
        let lanes: Vec<&str> = tables["SEC"].lanes.iter().map(|l| l.lane.as_str()).collect();
        assert_eq!(lanes, vec!["1", "2"]);
        assert_eq!(tables["SEC"].lanes[1].mw, "22+53");
    }

    #[test]
    fn test_model_from_workbook() {
        let workbook = Workbook {
            purification: sample_rows(),
            evidence: vec![EvidenceRow {
                step_no: "1".to_string(),
                step_name: "Protein A".to_string(),
                sds_picture: "gel.png".to_string(),
                sds_table: "SEC".to_string(),
                hplc_picture: "hplc.docx".to_string(),
                ..Default::default()
            }],
            lanes: Vec::new(),
        };
        let model = ReportModel::from_workbook_with_date(&workbook, "01/01/2000");

        assert_eq!(model.supernatant, "40");
        assert_eq!(model.sds_steps[0].picture, "gel.png");
        assert_eq!(model.sds_steps[0].table_key, "SEC");
        assert_eq!(model.hplc_steps[0].step_no, "1");
        assert_eq!(model.hplc_steps[0].picture, "hplc.docx");
    }

    #[test]
    fn test_model_from_empty_workbook() {
        let model = ReportModel::from_workbook_with_date(&Workbook::default(), "12/31/2024");

        assert_eq!(model.run.project_name, "project");
        assert_eq!(model.supernatant, "0");
        assert!(model.final_summary.is_empty());
        assert!(model.lineages.is_empty());
        assert!(model.step_tables.is_empty());
    }
}
