//! SDS-PAGE result slides: sample flow, gel panel, lane table, conclusion.

use super::style::{add_conclusion, add_eln, add_flow, add_label, section_title, style_table};
use super::{is_missing_reference, PageContext};
use purification_core::{Paginator, ReportModel, Result, SdsStepInfo, SdsTable};
use purification_pptx::{
    cm, Deck, Fill, Layout, LineStyle, Point, Rect, Rgb, ShapeKind, Slide,
};

/// Lane table rows per gel slide.
pub const LANES_PER_PAGE: usize = 12;

/// Step name whose gel shows raw supernatant rather than purified protein.
pub const SUPERNATANT_STEP: &str = "Supernatant";

/// Load annotation for supernatant gels.
pub const SUPERNATANT_LOAD: &str = "13 μL on SDS-PAGE";

/// Load annotation for every other gel.
pub const PROTEIN_LOAD: &str = "2 μg on SDS-PAGE";

/// Last box of every gel flow.
const STAINING: &str = "Staining";

pub const MARKER_ASSET: &str = "marker.jpg";
pub const ARROW_ASSET: &str = "arrow.png";

const LANE_HEADERS: [(&str, f64); 3] = [("Lane", 1.54), ("Protein name", 9.5), ("MW(kDa)", 3.8)];
const LADDER_LANE: &str = "M";
const LADDER_NAME: &str = "PageRuler™ Unstained Protein  Ladder";
const GEL_INFO: &str = "Gel info: NuPAGE, Novex 4-12% Bis-Tris Gel";
const PANEL_BORDER: Rgb = Rgb(56, 93, 138);

/// Marker arrows (top, cm) and the molecular weights they point at.
const MW_MARKS: [(f64, f64, &str); 3] = [
    (8.56, 8.4, "150 kDa"),
    (10.1, 10.0, "50 kDa"),
    (11.3, 11.2, "25 kDa"),
];

/// Emit gel slides for every step that has a gel picture.
///
/// The flow shown on each slide grows with the steps seen so far, skipped
/// steps included.
pub fn build_sds(deck: &mut Deck, model: &ReportModel, context: &PageContext) -> Result<()> {
    let mut flow = vec![format!("{}mL Protein Supernatant", model.supernatant)];

    for step in &model.sds_steps {
        let load = if step.step_name == SUPERNATANT_STEP {
            SUPERNATANT_LOAD
        } else {
            flow.push(step.step_name.clone());
            PROTEIN_LOAD
        };

        if is_missing_reference(&step.picture) {
            log::debug!("No gel picture for step '{}'", step.step_name);
            continue;
        }

        let mut labels = flow.clone();
        labels.push(load.to_string());
        labels.push(STAINING.to_string());

        let table = match model.sds_tables.get(&step.table_key) {
            Some(table) => table.clone(),
            None => {
                log::debug!("No lane table named '{}'", step.table_key);
                SdsTable::default()
            }
        };

        build_gel_step(deck, step, &labels, &table, context)?;
    }

    Ok(())
}

/// Slides for one gel: as many as the lane table needs, at least one.
fn build_gel_step(
    deck: &mut Deck,
    step: &SdsStepInfo,
    labels: &[String],
    table: &SdsTable,
    context: &PageContext,
) -> Result<()> {
    let picture = context.resolve(&step.picture);
    let paginator = Paginator::new(LANES_PER_PAGE).with_minimum_one_page();

    for page in paginator.pages(table.lanes.len()) {
        let lanes = &table.lanes[page];
        let slide = deck.new_slide(Layout::Evidence);
        slide.set_title(section_title(&format!("SDS-PAGE Results – {}", step.step_name)));
        add_flow(slide, 3.0, labels);

        let mut lane_names: Vec<&str> = lanes.iter().map(|l| l.lane.as_str()).collect();
        lane_names.push(LADDER_LANE);
        add_gel_panel(slide, &picture, &lane_names, context)?;
        add_lane_table(slide, lanes);

        add_conclusion(slide, Rect::cm(2.0, 16.2, 31.5, 3.0), &step.conclusion);
        add_eln(slide, &step.eln);
        log::debug!("Gel slide for '{}' with {} lanes", step.step_name, lanes.len());
    }

    Ok(())
}

fn add_gel_panel(
    slide: &mut Slide,
    picture: &std::path::Path,
    lanes: &[&str],
    context: &PageContext,
) -> Result<()> {
    slide
        .add_shape(ShapeKind::Rectangle, Rect::cm(2.5, 6.6, 13.6, 8.8))
        .fill(Fill::None)
        .outline(LineStyle::Solid {
            color: PANEL_BORDER,
            width: Some(cm(0.07)),
        })
        .without_shadow();

    if let Some(marker) = context.asset(MARKER_ASSET) {
        slide.add_picture(&marker, Point::cm(2.7, 7.8), None)?;
    }

    add_label(slide, Rect::cm(5.7, 6.6, 3.7, 0.9), "Non-reducing", 14.0);
    add_label(slide, Rect::cm(10.1, 6.6, 2.4, 0.9), "Reducing", 14.0);
    add_label(slide, Rect::cm(3.9, 7.4, 8.8, 0.9), &lanes.join("    "), 14.0);
    slide.add_connector(Point::cm(4.2, 7.5), Point::cm(9.8, 7.5), Rgb::BLACK);
    slide.add_connector(Point::cm(10.0, 7.5), Point::cm(12.4, 7.5), Rgb::BLACK);

    slide.add_picture(picture, Point::cm(4.18, 8.1), Some((cm(9.0), cm(5.82))))?;
    add_label(slide, Rect::cm(3.3, 14.5, 10.3, 0.9), GEL_INFO, 16.0);

    let arrow = context.asset(ARROW_ASSET);
    for (arrow_top, _, _) in MW_MARKS {
        if let Some(arrow) = &arrow {
            slide.add_picture(arrow, Point::cm(12.95, arrow_top), None)?;
        }
    }
    for (_, label_top, label) in MW_MARKS {
        add_label(slide, Rect::cm(14.0, label_top, 1.7, 0.9), label, 14.0);
    }

    Ok(())
}

/// Lane rows followed by the merged ladder row.
fn add_lane_table(slide: &mut Slide, lanes: &[purification_core::SdsLane]) {
    let rows = lanes.len();
    let table = slide.add_table(
        rows + 2,
        LANE_HEADERS.len(),
        Rect::cm(16.6, 6.6, 14.2, 1.0),
    );
    table.set_row_height(0, cm(1.13));
    for (col, (label, width)) in LANE_HEADERS.iter().enumerate() {
        table.set_column_width(col, cm(*width));
        table.set_text(0, col, *label);
    }

    for (index, lane) in lanes.iter().enumerate() {
        let row = index + 1;
        table.set_row_height(row, cm(0.71));
        table.set_text(row, 0, lane.lane.as_str());
        table.set_text(row, 1, lane.protein_name.as_str());
        table.set_text(row, 2, lane.mw.as_str());
    }

    let ladder = rows + 1;
    table.set_row_height(ladder, cm(0.71));
    table.set_text(ladder, 0, LADDER_LANE);
    table.merge_row_span(ladder, 1, LANE_HEADERS.len() - 1);
    table.set_text(ladder, 1, LADDER_NAME);
    style_table(table);
}
