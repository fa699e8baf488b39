//! CIELAB color space
//!
//! Lab is the space the palette optimizer works in. Lightness `l` runs from
//! 0 (black) to 100 (white); `a` and `b` span the chroma plane.
//!
//! # References
//!
//! CIE 15:2004, Colorimetry, 3rd edition, section 8.2.1

use super::lch::Lch;
use super::rgb::Rgb;
use super::xyz::{Xyz, EPSILON, KAPPA, WHITE};

/// A color in CIE 1976 L\*a\*b\* space, D65 white.
///
/// # Components
///
/// - `l`: Lightness (0.0 = black, 100.0 = white)
/// - `a`: Green-red axis (negative = green, positive = red)
/// - `b`: Blue-yellow axis (negative = blue, positive = yellow)
///
/// Values are not clamped. The optimizer proposes arbitrary coordinates and
/// relies on the gamut penalty to pull them back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    /// Create a new Lab color.
    ///
    /// ```
    /// use cielab::Lab;
    ///
    /// let grey = Lab::new(50.0, 0.0, 0.0);
    /// assert_eq!(grey.chroma(), 0.0);
    /// ```
    #[inline]
    pub fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Chroma, the distance from the neutral axis.
    #[inline]
    pub fn chroma(self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Hue angle in radians, `atan2(b, a)`.
    #[inline]
    pub fn hue(self) -> f64 {
        self.b.atan2(self.a)
    }

    #[inline]
    pub fn to_lch(self) -> Lch {
        Lch::from(self)
    }

    #[inline]
    pub fn to_xyz(self) -> Xyz {
        Xyz::from(self)
    }

    #[inline]
    pub fn to_rgb(self) -> Rgb {
        Rgb::from(self)
    }
}

impl From<Xyz> for Lab {
    /// Convert from XYZ to Lab (CIE 1976, D65).
    fn from(xyz: Xyz) -> Self {
        let f = |t: f64| {
            if t > EPSILON {
                t.cbrt()
            } else {
                (KAPPA * t + 16.0) / 116.0
            }
        };

        let fx = f(xyz.x / WHITE[0]);
        let fy = f(xyz.y / WHITE[1]);
        let fz = f(xyz.z / WHITE[2]);

        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }
}

impl From<Rgb> for Lab {
    #[inline]
    fn from(rgb: Rgb) -> Self {
        Lab::from(Xyz::from(rgb))
    }
}

impl From<Lch> for Lab {
    /// Convert from the polar form back to Cartesian coordinates.
    #[inline]
    fn from(lch: Lch) -> Self {
        let (sin, cos) = lch.h.sin_cos();
        Lab {
            l: lch.l,
            a: lch.c * cos,
            b: lch.c * sin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUND_TRIP_TOLERANCE: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn assert_lab_close(expected: Lab, actual: Lab, tol: f64) {
        assert!(
            approx_eq(expected.l, actual.l, tol)
                && approx_eq(expected.a, actual.a, tol)
                && approx_eq(expected.b, actual.b, tol),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_round_trip_through_rgb() {
        // A deterministic sweep through the visible range, in and out of gamut
        for l in [5.0, 20.0, 35.0, 50.0, 65.0, 80.0, 95.0] {
            for a in [-80.0, -40.0, -7.5, 0.0, 12.5, 45.0, 90.0] {
                for b in [-100.0, -30.0, 0.0, 25.0, 70.0] {
                    let lab = Lab::new(l, a, b);
                    let back = Lab::from(lab.to_rgb());
                    assert_lab_close(lab, back, ROUND_TRIP_TOLERANCE);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_through_xyz_dark_colors() {
        // Below the knee of the transfer function
        for l in [0.5, 2.0, 7.9] {
            let lab = Lab::new(l, 3.0, -2.0);
            let back = Lab::from(lab.to_xyz());
            assert_lab_close(lab, back, ROUND_TRIP_TOLERANCE);
        }
    }

    #[test]
    fn test_lch_round_trip() {
        let lab = Lab::new(62.0, -21.0, 33.0);
        let back = Lab::from(lab.to_lch());
        assert_lab_close(lab, back, 1e-12);
    }

    #[test]
    fn test_srgb_primaries() {
        // sRGB red in D65 Lab, no chromatic adaptation
        let red = Lab::from(Rgb::new(1.0, 0.0, 0.0));
        assert!(approx_eq(red.l, 53.24, 0.05), "red L = {}", red.l);
        assert!(approx_eq(red.a, 80.09, 0.05), "red a = {}", red.a);
        assert!(approx_eq(red.b, 67.20, 0.05), "red b = {}", red.b);

        let white = Lab::from(Rgb::new(1.0, 1.0, 1.0));
        assert_lab_close(Lab::new(100.0, 0.0, 0.0), white, 1e-6);
    }

    #[test]
    fn test_matches_palette_crate() {
        use palette::white_point::D65;
        use palette::{IntoColor, Lab as PaletteLab, Srgb as PaletteSrgb};

        let test_colors = [
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (0.5, 0.5, 0.5),
            (0.2, 0.6, 0.4),
            (0.9, 0.8, 0.1),
        ];

        for (r, g, b) in test_colors {
            let ours = Lab::from(Rgb::new(r, g, b));
            let theirs: PaletteLab<D65, f64> = PaletteSrgb::new(r, g, b).into_color();

            // palette derives its matrix from a slightly different white point
            assert!(
                approx_eq(ours.l, theirs.l, 0.01)
                    && approx_eq(ours.a, theirs.a, 0.05)
                    && approx_eq(ours.b, theirs.b, 0.05),
                "mismatch for ({r}, {g}, {b}): ours={ours:?}, palette=({}, {}, {})",
                theirs.l,
                theirs.a,
                theirs.b
            );
        }
    }

    #[test]
    fn test_chroma_and_hue() {
        let lab = Lab::new(50.0, 3.0, 4.0);
        assert_eq!(lab.chroma(), 5.0);
        assert!(approx_eq(lab.hue(), (4.0f64).atan2(3.0), 1e-15));
    }
}
