//! Formatting shared by the page builders.

use purification_core::labels::conclusion_sentences;
use purification_pptx::{
    cm, pt, Align, Anchor, Fill, LineStyle, Paragraph, Rect, Rgb, ShapeKind, Slide, Table,
    TextFrame, TextRun,
};

/// First title line of every content slide.
pub const SECTION_TITLE: &str = "Characterization";

/// Flow arrow background.
pub const ARROW_FILL: Rgb = Rgb(208, 216, 232);

/// Flow step boxes and picture outlines.
pub const ACCENT: Rgb = Rgb(79, 129, 189);

/// Left edge and size of a flow arrow, in centimetres.
const FLOW_LEFT: f64 = 2.3;
const FLOW_WIDTH: f64 = 31.5;
const FLOW_HEIGHT: f64 = 4.28;

/// Step boxes inside a flow arrow, in centimetres.
const BOX_LEFT: f64 = 3.0;
const BOX_TOP_OFFSET: f64 = 1.05;
const BOX_WIDTH: f64 = 3.6;
const BOX_HEIGHT: f64 = 2.1;
/// Width the boxes and their gaps share.
const BOX_RUN_WIDTH: f64 = 27.9;

/// ELN reference text box.
const ELN_FRAME: (f64, f64, f64, f64) = (28.5, 18.8, 3.0, 1.11);

/// `Characterization` over an italic, non-bold subtitle line.
pub fn section_title(subtitle: &str) -> TextFrame {
    TextFrame::from_text(SECTION_TITLE)
        .with_paragraph(Paragraph::text(subtitle).italic(true).bold(false))
}

/// `Characterization` over `<lead>- Protein Purification Summary`, where
/// the lead word keeps the title's bold.
pub fn summary_title(lead: &str) -> TextFrame {
    TextFrame::from_text(SECTION_TITLE).with_paragraph(
        Paragraph::new()
            .italic(true)
            .run(TextRun::new(lead))
            .run(TextRun::new("- Protein Purification Summary").bold(false)),
    )
}

/// Centre every cell at 14 pt with no inner margins.
pub fn style_table(table: &mut Table) {
    table.style_cells(pt(14.0), Align::Center, Anchor::Middle);
}

/// Add a one-paragraph text box.
pub fn add_label(slide: &mut Slide, frame: Rect, text: &str, size: f64) {
    let textbox = slide.add_textbox(frame);
    textbox.text.set_text(text);
    textbox.text.format_paragraphs(pt(size), None);
}

/// Fill the body placeholder with a `Conclusion` heading and one indented
/// paragraph per `|`-separated sentence.
pub fn add_conclusion(slide: &mut Slide, frame: Rect, conclusion: &str) {
    let mut text = TextFrame::new()
        .with_paragraph(Paragraph::text("Conclusion").size(pt(18.0)).bold(true));
    for sentence in conclusion_sentences(conclusion) {
        text.add_paragraph(Paragraph::text(sentence).bold(false).size(pt(14.0)).level(1));
    }
    slide.set_body(frame, text);
}

/// ELN reference in the lower right corner.
pub fn add_eln(slide: &mut Slide, eln: &str) {
    let (left, top, width, height) = ELN_FRAME;
    add_label(slide, Rect::cm(left, top, width, height), eln, 10.0);
}

/// Gap between flow boxes so that `count` boxes fill the arrow.
pub fn flow_margin(count: usize) -> f64 {
    if count < 2 {
        return 0.0;
    }
    let margin = (BOX_RUN_WIDTH - count as f64 * BOX_WIDTH) / (count - 1) as f64;
    (margin * 100.0).round() / 100.0
}

/// Draw a right arrow at `top` with one rounded box per label.
pub fn add_flow(slide: &mut Slide, top: f64, labels: &[String]) {
    slide
        .add_shape(
            ShapeKind::RightArrow,
            Rect::cm(FLOW_LEFT, top, FLOW_WIDTH, FLOW_HEIGHT),
        )
        .fill(Fill::Solid(ARROW_FILL))
        .outline(LineStyle::None)
        .without_shadow();

    let margin = cm(flow_margin(labels.len()));
    let mut frame = Rect::cm(BOX_LEFT, top + BOX_TOP_OFFSET, BOX_WIDTH, BOX_HEIGHT);
    for label in labels {
        let shape = slide.add_shape(ShapeKind::RoundedRectangle, frame);
        shape
            .fill(Fill::Solid(ACCENT))
            .outline(LineStyle::Solid {
                color: Rgb::WHITE,
                width: Some(cm(0.07)),
            })
            .without_shadow();
        shape.text.set_text(label.as_str());
        shape.text.format_paragraphs(pt(14.0), Some(Align::Center));
        frame.x = frame.x + frame.cx + margin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purification_pptx::{Layout, Shape};

    #[test]
    fn test_flow_margin() {
        assert_eq!(flow_margin(7), 0.45);
        assert_eq!(flow_margin(6), 1.26);
        assert_eq!(flow_margin(4), 4.5);
        assert_eq!(flow_margin(1), 0.0);
    }

    #[test]
    fn test_add_flow_lays_out_boxes() {
        let mut slide = Slide::new(Layout::Diagram);
        let labels: Vec<String> = ["Protein # 1", "SEC", "Filtration & Storage"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        add_flow(&mut slide, 3.0, &labels);

        assert_eq!(slide.shapes.len(), 4);
        let boxes: Vec<_> = slide
            .shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Auto(a) if a.kind == ShapeKind::RoundedRectangle => Some(a),
                _ => None,
            })
            .collect();
        assert_eq!(boxes[0].frame.x, cm(3.0));
        assert_eq!(boxes[0].frame.y, cm(4.05));
        assert_eq!(boxes[1].frame.x, cm(3.0) + cm(3.6) + cm(8.55));
        assert_eq!(boxes[2].text.text(), "Filtration & Storage");
    }

    #[test]
    fn test_conclusion_paragraphs() {
        let mut slide = Slide::new(Layout::Evidence);
        add_conclusion(&mut slide, Rect::cm(2.0, 16.2, 31.5, 3.0), "Pure.|No aggregates.");
        let body = slide.body.as_ref().unwrap();
        assert_eq!(body.text.paragraphs.len(), 3);
        assert_eq!(body.text.paragraphs[0].plain_text(), "Conclusion");
        assert_eq!(body.text.paragraphs[0].style.bold, Some(true));
        assert_eq!(body.text.paragraphs[2].plain_text(), "No aggregates.");
        assert_eq!(body.text.paragraphs[2].level, 1);
    }

    #[test]
    fn test_titles() {
        assert_eq!(
            section_title("Protein Purification Process").text(),
            "Characterization\nProtein Purification Process"
        );
        assert_eq!(
            summary_title("Final ").text(),
            "Characterization\nFinal - Protein Purification Summary"
        );
    }
}
