//! Final purification summary: one row per protein at its last step.

use super::style::{style_table, summary_title};
use purification_core::{FinalSummary, Paginator};
use purification_pptx::{cm, Deck, Layout, Rect};

/// Proteins per summary slide.
pub const ROWS_PER_PAGE: usize = 10;

/// Header labels and column widths (cm).
pub const COLUMNS: [(&str, f64); 12] = [
    ("No", 1.23),
    ("Protein Name", 6.18),
    ("Concentration (mg/ml)", 3.58),
    ("Volume (ml)", 2.17),
    ("Amount (mg)", 2.37),
    ("Yield (mg/L)", 1.99),
    ("Buffer", 1.88),
    ("Purity by SEC-HPLC (%)", 3.85),
    ("Supernatant (mL)", 3.21),
    ("MW (kDa)", 1.78),
    ("PI", 1.47),
    ("Comments", 3.89),
];

const TABLE_LEFT: f64 = 0.13;
const TABLE_TOP: f64 = 3.3;
const HEADER_HEIGHT: f64 = 1.92;
const ROW_HEIGHT: f64 = 1.2;

/// Emit the summary slides; nothing when there are no proteins.
pub fn build_summary(deck: &mut Deck, summary: &FinalSummary) {
    let proteins: Vec<_> = summary.iter().collect();
    let width: f64 = COLUMNS.iter().map(|(_, w)| w).sum();

    for page in Paginator::new(ROWS_PER_PAGE).pages(proteins.len()) {
        let rows = &proteins[page];
        let slide = deck.new_slide(Layout::Summary);
        slide.set_title(summary_title("Final "));

        let height = HEADER_HEIGHT + rows.len() as f64 * ROW_HEIGHT;
        let table = slide.add_table(
            rows.len() + 1,
            COLUMNS.len(),
            Rect::cm(TABLE_LEFT, TABLE_TOP, width, height),
        );
        table.set_row_height(0, cm(HEADER_HEIGHT));
        for (col, (label, col_width)) in COLUMNS.iter().enumerate() {
            table.set_column_width(col, cm(*col_width));
            table.set_text(0, col, *label);
        }

        for (index, (name, entry)) in rows.iter().enumerate() {
            let row = index + 1;
            table.set_row_height(row, cm(ROW_HEIGHT));
            table.set_text(row, 0, entry.no.as_str());
            table.set_text(row, 1, name.as_str());
            for (col, (label, _)) in COLUMNS.iter().enumerate().skip(2) {
                table.set_text(row, col, entry.lookup(label));
            }
        }
        style_table(table);
        log::debug!("Summary slide with {} proteins", rows.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purification_core::{Attribute, ProteinEntry};

    fn summary(count: usize) -> FinalSummary {
        (1..=count)
            .map(|n| {
                let mut entry = ProteinEntry {
                    no: n.to_string(),
                    ..Default::default()
                };
                entry.attributes.set(Attribute::Concentration, "1.50");
                entry.attributes.set(Attribute::Mw, "147");
                (format!("P{}", n), entry)
            })
            .collect()
    }

    fn table_rows(deck: &Deck) -> Vec<usize> {
        deck.slides()
            .iter()
            .map(|slide| match &slide.shapes[0] {
                purification_pptx::Shape::Table(table) => table.row_count(),
                _ => 0,
            })
            .collect()
    }

    #[test]
    fn test_pages_hold_ten_proteins() {
        let mut deck = Deck::new();
        build_summary(&mut deck, &summary(23));
        assert_eq!(table_rows(&deck), vec![11, 11, 4]);
    }

    #[test]
    fn test_empty_summary_emits_nothing() {
        let mut deck = Deck::new();
        build_summary(&mut deck, &FinalSummary::new());
        assert!(deck.is_empty());
    }

    #[test]
    fn test_columns_resolve_by_label() {
        let mut deck = Deck::new();
        build_summary(&mut deck, &summary(2));
        let purification_pptx::Shape::Table(table) = &deck.slides()[0].shapes[0] else {
            panic!("expected a table");
        };
        assert_eq!(table.cell_text(0, 2), "Concentration (mg/ml)");
        assert_eq!(table.cell_text(2, 0), "2");
        assert_eq!(table.cell_text(2, 1), "P2");
        assert_eq!(table.cell_text(2, 2), "1.50");
        assert_eq!(table.cell_text(2, 3), "");
        assert_eq!(table.cell_text(2, 9), "147");
        assert_eq!(table.columns[1], cm(6.18));
    }
}
