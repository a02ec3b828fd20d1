//! Length and font-size units used by slide geometry.

use serde::{Deserialize, Serialize};

/// English Metric Units per centimetre.
pub const EMU_PER_CM: f64 = 360_000.0;

/// English Metric Units per pixel at 96 dpi.
pub const EMU_PER_PIXEL: i64 = 9_525;

/// A length in English Metric Units, the native OOXML drawing unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Emu(pub i64);

impl Emu {
    pub fn value(self) -> i64 {
        self.0
    }

    /// Length in centimetres, for messages and tests.
    pub fn as_cm(self) -> f64 {
        self.0 as f64 / EMU_PER_CM
    }

    pub fn from_pixels(pixels: u32) -> Self {
        Emu(pixels as i64 * EMU_PER_PIXEL)
    }
}

impl std::ops::Add for Emu {
    type Output = Emu;

    fn add(self, rhs: Emu) -> Emu {
        Emu(self.0 + rhs.0)
    }
}

impl std::fmt::Display for Emu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert centimetres to EMU.
pub fn cm(value: f64) -> Emu {
    Emu((value * EMU_PER_CM).round() as i64)
}

/// A font size in hundredths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSize(pub u32);

impl std::fmt::Display for FontSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert points to a font size.
pub fn pt(value: f64) -> FontSize {
    FontSize((value * 100.0).round() as u32)
}

/// A point on the slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: Emu,
    pub y: Emu,
}

impl Point {
    pub fn cm(x: f64, y: f64) -> Self {
        Self { x: cm(x), y: cm(y) }
    }
}

/// An axis-aligned frame: offset plus extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: Emu,
    pub y: Emu,
    pub cx: Emu,
    pub cy: Emu,
}

impl Rect {
    /// Build a frame from `left`, `top`, `width`, `height` in centimetres.
    pub fn cm(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            x: cm(left),
            y: cm(top),
            cx: cm(width),
            cy: cm(height),
        }
    }

    pub fn at(origin: Point, cx: Emu, cy: Emu) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            cx,
            cy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cm_conversion() {
        assert_eq!(cm(1.0), Emu(360_000));
        assert_eq!(cm(33.867), Emu(12_192_120));
        assert_eq!(cm(0.07), Emu(25_200));
        assert!((cm(3.6).as_cm() - 3.6).abs() < 1e-9);
    }

    #[test]
    fn test_pt_conversion() {
        assert_eq!(pt(14.0), FontSize(1400));
        assert_eq!(pt(10.5), FontSize(1050));
    }

    #[test]
    fn test_pixels_at_96_dpi() {
        assert_eq!(Emu::from_pixels(96), Emu(914_400));
    }

    #[test]
    fn test_rect_cm() {
        let rect = Rect::cm(2.3, 3.0, 31.5, 4.28);
        assert_eq!(rect.x, cm(2.3));
        assert_eq!(rect.cy, cm(4.28));
    }
}
