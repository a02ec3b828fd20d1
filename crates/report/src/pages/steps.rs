//! Per-step protein tables, packed two to a slide.

use super::style::{add_label, style_table, summary_title};
use purification_core::{Slot, SlotMachine, StepTable};
use purification_pptx::{cm, Deck, Layout, Rect, Slide};

/// Columns for capture steps (affinity resins), which report no recovery.
pub const CAPTURE_COLUMNS: [(&str, f64); 11] = [
    ("No", 1.4),
    ("Protein Name", 6.94),
    ("Concentration (mg/ml)", 3.58),
    ("Volume (ml)", 2.24),
    ("Amount (mg)", 2.45),
    ("Yield (mg/L)", 2.05),
    ("Buffer", 4.23),
    ("Purity by SEC-HPLC (%)", 3.98),
    ("Supernatant (mL)", 3.32),
    ("PI", 1.07),
    ("Comments", 3.16),
];

/// Columns for every other step.
pub const POLISH_COLUMNS: [(&str, f64); 12] = [
    ("No", 1.4),
    ("Protein Name", 6.94),
    ("Concentration (mg/ml)", 3.58),
    ("Volume (ml)", 2.24),
    ("Amount (mg)", 2.45),
    ("Yield (mg/L)", 2.05),
    ("Buffer", 1.89),
    ("Purity by SEC-HPLC (%)", 3.87),
    ("Supernatant (mL)", 3.23),
    ("Recovery(%)", 2.93),
    ("PI", 1.07),
    ("Comments", 2.89),
];

const HEADING_LEFT: f64 = 2.2;
const HEADING_WIDTH: f64 = 8.65;
const HEADING_HEIGHT: f64 = 1.11;
const TABLE_LEFT: f64 = 0.6;
const TABLE_WIDTH: f64 = 34.38;
const TABLE_HEIGHT: f64 = 6.8;
const HEADER_HEIGHT: f64 = 1.54;
const ROW_HEIGHT: f64 = 1.05;

/// Whether a step uses [`CAPTURE_COLUMNS`].
pub fn is_capture_step(step_name: &str) -> bool {
    step_name.contains("Protein A") || step_name.contains("Ni")
}

fn slot_top(slot: Slot) -> f64 {
    match slot {
        Slot::First => 2.8,
        Slot::Second => 10.8,
    }
}

/// Emit the step slides; nothing when there are no steps.
pub fn build_steps(deck: &mut Deck, steps: &[StepTable]) {
    let mut machine = SlotMachine::new();
    for step in steps {
        let placement = machine.place(step.proteins.len());
        if placement.new_slide || deck.is_empty() {
            let slide = deck.new_slide(Layout::Diagram);
            slide.set_title(summary_title("Steps "));
        }
        if let Some(slide) = deck.last_slide_mut() {
            place_step_table(slide, step, slot_top(placement.slot));
        }
        log::debug!(
            "Step {} ({} proteins) placed in {:?}",
            step.step_no,
            step.proteins.len(),
            placement.slot
        );
    }
}

fn place_step_table(slide: &mut Slide, step: &StepTable, top: f64) {
    add_label(
        slide,
        Rect::cm(HEADING_LEFT, top, HEADING_WIDTH, HEADING_HEIGHT),
        &format!("{}. {}", step.step_no, step.step_name),
        20.0,
    );

    let columns: &[(&str, f64)] = if is_capture_step(&step.step_name) {
        &CAPTURE_COLUMNS
    } else {
        &POLISH_COLUMNS
    };

    let table = slide.add_table(
        step.proteins.len() + 1,
        columns.len(),
        Rect::cm(TABLE_LEFT, top + HEADING_HEIGHT, TABLE_WIDTH, TABLE_HEIGHT),
    );
    table.set_row_height(0, cm(HEADER_HEIGHT));
    for (col, (label, width)) in columns.iter().enumerate() {
        table.set_column_width(col, cm(*width));
        table.set_text(0, col, *label);
    }

    for (index, (name, entry)) in step.proteins.iter().enumerate() {
        let row = index + 1;
        table.set_row_height(row, cm(ROW_HEIGHT));
        table.set_text(row, 0, entry.no.as_str());
        table.set_text(row, 1, name.as_str());
        for (col, (label, _)) in columns.iter().enumerate().skip(2) {
            table.set_text(row, col, entry.lookup(label));
        }
    }
    style_table(table);
}
