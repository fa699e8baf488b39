//! CIEDE2000 color difference
//!
//! Delegates to the `palette` crate's implementation of CIE Technical Report
//! 142-2001 with unit parametric factors (`kL = kC = kH = 1`).

use palette::color_difference::Ciede2000;
use palette::white_point::D65;

use crate::color::Lab;

#[inline]
fn to_palette(lab: Lab) -> palette::Lab<D65, f64> {
    palette::Lab::new(lab.l, lab.a, lab.b)
}

/// CIEDE2000 color difference between two Lab colors.
///
/// Symmetric and non-negative; zero for identical colors.
///
/// ```
/// use cielab::{ciede2000, Lab};
///
/// let a = Lab::new(50.0, 2.6772, -79.7751);
/// let b = Lab::new(50.0, 0.0, -82.7485);
/// assert!((ciede2000(a, b) - 2.0425).abs() < 1e-4);
/// ```
#[inline]
pub fn ciede2000(lab1: Lab, lab2: Lab) -> f64 {
    to_palette(lab1).difference(to_palette(lab2))
}
