//! Polar form of CIELAB

use super::lab::Lab;

/// A color as lightness, chroma and hue.
///
/// Hue `h` is in radians, measured counter-clockwise from the positive `a`
/// axis. Derived on demand from [`Lab`]; never the primary representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lch {
    /// Lightness, same scale as Lab
    pub l: f64,
    /// Chroma, non-negative for colors derived from Lab
    pub c: f64,
    /// Hue angle in radians
    pub h: f64,
}

impl Lch {
    #[inline]
    pub fn new(l: f64, c: f64, h: f64) -> Self {
        Self { l, c, h }
    }

    #[inline]
    pub fn to_lab(self) -> Lab {
        Lab::from(self)
    }

    /// The same lightness and hue with a different chroma.
    #[inline]
    pub fn with_chroma(self, c: f64) -> Self {
        Self { c, ..self }
    }
}

impl From<Lab> for Lch {
    #[inline]
    fn from(lab: Lab) -> Self {
        Lch {
            l: lab.l,
            c: lab.chroma(),
            h: lab.hue(),
        }
    }
}
