//! Subtractive CMY complement of sRGB

use super::rgb::Rgb;

/// A color as cyan, magenta and yellow ink coverage.
///
/// Printable colors have non-negative coverage on every channel. There is
/// no upper bound: heavy coverage is still printable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cmy {
    pub c: f64,
    pub m: f64,
    pub y: f64,
}

impl Cmy {
    #[inline]
    pub fn new(c: f64, m: f64, y: f64) -> Self {
        Self { c, m, y }
    }
}

impl From<Rgb> for Cmy {
    #[inline]
    fn from(rgb: Rgb) -> Self {
        Cmy {
            c: 1.0 - rgb.r,
            m: 1.0 - rgb.g,
            y: 1.0 - rgb.b,
        }
    }
}
