//! CIE 1931 XYZ tristimulus values
//!
//! XYZ is the hub between the perceptual Lab coordinates and the device
//! RGB coordinates. All values are relative to the D65 reference white with
//! `Y = 1.0` for white.

use super::lab::Lab;
use super::rgb::{decode, Rgb, LINEAR_SRGB_TO_XYZ};

/// D65 reference white, derived from the chromaticity `(0.3127, 0.3290)`
/// so that it matches the sRGB matrices exactly.
pub(crate) const WHITE: [f64; 3] = [
    0.3127 / 0.3290,
    1.0,
    (1.0 - 0.3127 - 0.3290) / 0.3290,
];

/// `(6/29)^3`, the knee of the Lab transfer function.
pub(crate) const EPSILON: f64 = 216.0 / 24389.0;
/// `(29/3)^3`, the slope of the linear segment of the Lab transfer function.
pub(crate) const KAPPA: f64 = 24389.0 / 27.0;

/// A color as CIE XYZ tristimulus values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Multiply a 3x3 matrix with a 3-vector.
#[inline]
pub(crate) fn multiply(matrix: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    let [row1, row2, row3] = matrix;
    [
        row1[0].mul_add(v[0], row1[1].mul_add(v[1], row1[2] * v[2])),
        row2[0].mul_add(v[0], row2[1].mul_add(v[1], row2[2] * v[2])),
        row3[0].mul_add(v[0], row3[1].mul_add(v[1], row3[2] * v[2])),
    ]
}

impl From<Lab> for Xyz {
    /// Convert from Lab to XYZ (CIE 1976, D65).
    ///
    /// Total over all inputs: a negative or huge lightness produces negative
    /// or huge tristimulus values, never a failure.
    fn from(lab: Lab) -> Self {
        let fy = (lab.l + 16.0) / 116.0;
        let fx = fy + lab.a / 500.0;
        let fz = fy - lab.b / 200.0;

        let inverse = |f: f64| {
            let cube = f * f * f;
            if cube > EPSILON {
                cube
            } else {
                (116.0 * f - 16.0) / KAPPA
            }
        };

        let yr = if lab.l > KAPPA * EPSILON {
            fy * fy * fy
        } else {
            lab.l / KAPPA
        };

        Xyz {
            x: inverse(fx) * WHITE[0],
            y: yr * WHITE[1],
            z: inverse(fz) * WHITE[2],
        }
    }
}

impl From<Rgb> for Xyz {
    /// Convert from gamma-encoded sRGB to XYZ.
    fn from(rgb: Rgb) -> Self {
        let linear = [decode(rgb.r), decode(rgb.g), decode(rgb.b)];
        let [x, y, z] = multiply(&LINEAR_SRGB_TO_XYZ, linear);
        Xyz { x, y, z }
    }
}
