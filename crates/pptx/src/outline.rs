//! Text outline of a saved presentation.

use serde::{Deserialize, Serialize};

/// All slides of a presentation as positioned text lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outline {
    /// File name the outline was read from.
    pub source: String,
    pub slides: Vec<SlideOutline>,
}

impl Outline {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            slides: Vec::new(),
        }
    }

    pub fn add_slide(&mut self, slide: SlideOutline) {
        self.slides.push(slide);
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

/// Text of one slide, in reading order after [`SlideOutline::sort_by_position`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideOutline {
    /// 1-based slide number.
    pub number: usize,
    pub lines: Vec<OutlineLine>,
}

impl SlideOutline {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            lines: Vec::new(),
        }
    }

    pub fn add_line_with_position(&mut self, text: impl Into<String>, y: f64, x: f64) {
        self.lines.push(OutlineLine {
            text: text.into(),
            y_position: Some(y),
            x_position: Some(x),
        });
    }

    /// Sort lines top-to-bottom, then left-to-right.
    pub fn sort_by_position(&mut self) {
        self.lines.sort_by(|a, b| {
            let y_cmp = a
                .y_position
                .partial_cmp(&b.y_position)
                .unwrap_or(std::cmp::Ordering::Equal);
            if y_cmp == std::cmp::Ordering::Equal {
                a.x_position
                    .partial_cmp(&b.x_position)
                    .unwrap_or(std::cmp::Ordering::Equal)
            } else {
                y_cmp
            }
        });
    }

    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }
}

/// Text of one shape or table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineLine {
    pub text: String,
    /// Top offset in EMU, if the shape has an explicit frame.
    pub y_position: Option<f64>,
    pub x_position: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_position() {
        let mut slide = SlideOutline::new(1);
        slide.add_line_with_position("bottom", 200.0, 0.0);
        slide.add_line_with_position("top right", 100.0, 50.0);
        slide.add_line_with_position("top left", 100.0, 10.0);
        slide.sort_by_position();
        assert_eq!(slide.texts(), vec!["top left", "top right", "bottom"]);
        assert!(slide.contains("right"));
    }
}
