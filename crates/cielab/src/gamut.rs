//! Gamut and chroma constraints
//!
//! The optimizer needs a smooth-ish measure of "how wrong" a color is rather
//! than a yes/no answer, so the functions here return distances:
//!
//! - [`off_rgb`]: how far the color lies outside the sRGB cube and the
//!   non-negative CMY octant
//! - [`off_chroma`]: how far its chroma exceeds a cap
//!
//! Both are zero exactly when the constraint holds.

use crate::color::{Cmy, Lab, Lch, Rgb};

/// Absolute tolerance of the chroma search in [`max_chroma`].
pub const CHROMA_TOLERANCE: f64 = 1e-13;

/// Upper bound for the doubling phase of [`max_chroma`]. No displayable
/// color comes anywhere near it.
const CHROMA_LIMIT: f64 = 1e4;

/// Distance outside `[0, 1]`.
#[inline]
fn outside_unit(v: f64) -> f64 {
    if v < 0.0 {
        -v
    } else if v > 1.0 {
        v - 1.0
    } else {
        0.0
    }
}

/// Distance below `0`.
#[inline]
fn below_zero(v: f64) -> f64 {
    if v < 0.0 {
        -v
    } else {
        0.0
    }
}

/// Gamut penalty: Euclidean norm of the per-channel violations of the sRGB
/// range `[0, 1]` and the CMY range `[0, +inf)`.
///
/// ```
/// use cielab::{off_rgb, Lab};
///
/// assert_eq!(off_rgb(Lab::new(50.0, 10.0, 10.0)), 0.0);
/// assert!(off_rgb(Lab::new(50.0, 120.0, 0.0)) > 0.0);
/// ```
pub fn off_rgb(lab: Lab) -> f64 {
    let rgb = Rgb::from(lab);
    let cmy = Cmy::from(rgb);

    let violations = [
        outside_unit(rgb.r),
        outside_unit(rgb.g),
        outside_unit(rgb.b),
        below_zero(cmy.c),
        below_zero(cmy.m),
        below_zero(cmy.y),
    ];
    violations.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Chroma penalty: excess of the color's chroma over `max_chroma`.
///
/// A negative `max_chroma` means unconstrained and always yields zero.
#[inline]
pub fn off_chroma(lab: Lab, max_chroma: f64) -> f64 {
    if max_chroma < 0.0 {
        return 0.0;
    }
    (lab.chroma() - max_chroma).max(0.0)
}

/// Whether the color is displayable and within the chroma cap.
#[inline]
pub fn in_gamut(lab: Lab, max_chroma: f64) -> bool {
    off_rgb(lab) == 0.0 && off_chroma(lab, max_chroma) == 0.0
}

/// Find the largest chroma at the given lightness and hue that is still in
/// gamut and within `cap` (negative `cap` means no cap).
///
/// Doubles an outer bound until it leaves the gamut, then bisects between
/// the last valid and the first invalid chroma until they are within
/// [`CHROMA_TOLERANCE`]. The input chroma is ignored. If even the neutral
/// color is out of gamut (lightness outside `0..=100`), the result has zero
/// chroma.
///
/// ```
/// use cielab::{max_chroma, off_rgb, Lch};
///
/// let lch = max_chroma(Lch::new(50.0, 0.0, 0.0), -1.0);
/// assert!(lch.c > 0.0);
/// assert_eq!(off_rgb(lch.to_lab()), 0.0);
/// ```
pub fn max_chroma(lch: Lch, cap: f64) -> Lch {
    let valid = |c: f64| in_gamut(Lab::from(lch.with_chroma(c)), cap);

    let mut inner = 0.0;
    if !valid(inner) {
        return lch.with_chroma(inner);
    }

    let mut outer = 1.0;
    while valid(outer) {
        inner = outer;
        outer *= 2.0;
        if outer > CHROMA_LIMIT {
            return lch.with_chroma(inner);
        }
    }

    while outer - inner > CHROMA_TOLERANCE {
        let mid = (inner + outer) / 2.0;
        if mid <= inner || mid >= outer {
            break;
        }
        if valid(mid) {
            inner = mid;
        } else {
            outer = mid;
        }
    }

    lch.with_chroma(inner)
}
