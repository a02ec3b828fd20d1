//! Purification process diagrams: one flow arrow per lineage.

use super::style::{add_flow, section_title};
use purification_core::{Paginator, ProcessLineage};
use purification_pptx::{Deck, Layout};

/// Lineages per process slide.
pub const LINEAGES_PER_PAGE: usize = 3;

/// Top edge (cm) of each arrow on a slide.
const ARROW_TOPS: [f64; LINEAGES_PER_PAGE] = [3.0, 8.5, 14.0];

/// Emit the process slides; nothing when there are no lineages.
pub fn build_process(deck: &mut Deck, lineages: &[ProcessLineage]) {
    for page in Paginator::new(LINEAGES_PER_PAGE).pages(lineages.len()) {
        let slide = deck.new_slide(Layout::Diagram);
        slide.set_title(section_title("Protein Purification Process"));

        for (lineage, top) in lineages[page].iter().zip(ARROW_TOPS) {
            add_flow(slide, top, &lineage.sequence());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lineage(nos: &[&str], steps: &[&str]) -> ProcessLineage {
        ProcessLineage {
            protein_nos: nos.iter().map(|s| s.to_string()).collect(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_three_lineages_per_slide() {
        let lineages: Vec<_> = (1..=4)
            .map(|n| lineage(&[&n.to_string()], &["Protein A", "SEC"]))
            .collect();
        let mut deck = Deck::new();
        build_process(&mut deck, &lineages);

        assert_eq!(deck.len(), 2);
        // Arrow plus four boxes per lineage.
        assert_eq!(deck.slides()[0].shapes.len(), 15);
        assert_eq!(deck.slides()[1].shapes.len(), 5);
        assert!(deck.slides()[1]
            .texts()
            .contains(&"Protein # 4".to_string()));
    }

    #[test]
    fn test_no_lineages_no_slides() {
        let mut deck = Deck::new();
        build_process(&mut deck, &[]);
        assert!(deck.is_empty());
    }
}
