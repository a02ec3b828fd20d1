//! Cover slide.

use purification_core::Run;
use purification_pptx::{Deck, Layout, Paragraph, TextFrame};

/// Title `<project> Purification Report`, subtitle organization and date.
pub fn build_cover(deck: &mut Deck, run: &Run, organization: &str) {
    let slide = deck.new_slide(Layout::Cover);
    slide.set_title(TextFrame::from_text(format!(
        "{} Purification Report",
        run.project_name
    )));
    slide.set_subtitle(
        TextFrame::from_text(organization).with_paragraph(Paragraph::text(run.date.as_str())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_text() {
        let mut deck = Deck::new();
        let run = Run {
            project_name: "WBP123".to_string(),
            date: "04/13/2020".to_string(),
        };
        build_cover(&mut deck, &run, "BID_PE");

        assert_eq!(deck.len(), 1);
        let slide = &deck.slides()[0];
        assert_eq!(slide.layout, Layout::Cover);
        assert_eq!(slide.texts(), vec!["WBP123 Purification Report", "BID_PE\n04/13/2020"]);
    }
}
