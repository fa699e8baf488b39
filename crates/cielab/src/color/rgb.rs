//! sRGB color type
//!
//! sRGB is the display color space whose unit cube defines the screen gamut.
//! Channels are gamma-encoded; values outside `0.0..=1.0` are kept as-is so
//! that the gamut penalty can measure them.

use std::fmt;
use std::str::FromStr;

use super::lab::Lab;
use super::xyz::{multiply, Xyz};
use crate::error::ParseColorError;

// https://github.com/color-js/color.js/blob/a77e080a070039c534dda3965a769675aac5f75e/src/spaces/srgb-linear.js

#[rustfmt::skip]
pub(crate) const LINEAR_SRGB_TO_XYZ: [[f64; 3]; 3] = [
    [ 0.41239079926595934, 0.357584339383878,   0.1804807884018343  ],
    [ 0.21263900587151027, 0.715168678767756,   0.07219231536073371 ],
    [ 0.01933081871559182, 0.11919477979462598, 0.9505321522496607  ],
];

#[rustfmt::skip]
pub(crate) const XYZ_TO_LINEAR_SRGB: [[f64; 3]; 3] = [
    [  3.2409699419045226,  -1.537383177570094,   -0.4986107602930034  ],
    [ -0.9692436362808796,   1.8759675015077202,   0.04155505740717559 ],
    [  0.05563007969699366, -0.20397695888897652,  1.0569715142428786  ],
];

/// Gamma-encode one linear channel, preserving the sign of negative values.
#[inline]
pub(crate) fn encode(value: f64) -> f64 {
    let magnitude = value.abs();
    if magnitude <= 0.0031308 {
        value * 12.92
    } else {
        magnitude
            .powf(1.0 / 2.4)
            .mul_add(1.055, -0.055)
            .copysign(value)
    }
}

/// Gamma-decode one channel, preserving the sign of negative values.
#[inline]
pub(crate) fn decode(value: f64) -> f64 {
    let magnitude = value.abs();
    if magnitude <= 0.04045 {
        value / 12.92
    } else {
        ((magnitude + 0.055) / 1.055).powf(2.4).copysign(value)
    }
}

/// A color in gamma-encoded sRGB.
///
/// In-gamut colors have all three channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red channel
    pub r: f64,
    /// Green channel
    pub g: f64,
    /// Blue channel
    pub b: f64,
}

impl Rgb {
    #[inline]
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Create an Rgb color from 8-bit channel values.
    ///
    /// # Example
    /// ```
    /// use cielab::Rgb;
    /// let red = Rgb::from_u8(255, 0, 0);
    /// assert_eq!(red.r, 1.0);
    /// ```
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Convert to a byte array [R, G, B].
    ///
    /// Rounds and clamps values to the 0..=255 range, so out-of-gamut colors
    /// are clipped.
    #[inline]
    pub fn to_bytes(self) -> [u8; 3] {
        [
            (self.r * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.g * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.b * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }

    /// Format as lower-case `#rrggbb`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_bytes();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Whether every channel lies in `0.0..=1.0`.
    #[inline]
    pub fn is_displayable(self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| 0.0 <= *c && *c <= 1.0)
    }
}

impl From<Xyz> for Rgb {
    /// Convert from XYZ to gamma-encoded sRGB (no clamping).
    fn from(xyz: Xyz) -> Self {
        let [r, g, b] = multiply(&XYZ_TO_LINEAR_SRGB, [xyz.x, xyz.y, xyz.z]);
        Rgb {
            r: encode(r),
            g: encode(g),
            b: encode(b),
        }
    }
}

impl From<Lab> for Rgb {
    #[inline]
    fn from(lab: Lab) -> Self {
        Rgb::from(Xyz::from(lab))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Parse `#rrggbb` or `#rgb`, with or without the `#`, in any case.
    ///
    /// ```
    /// use cielab::Rgb;
    ///
    /// let red: Rgb = "#F00".parse().unwrap();
    /// assert_eq!(red.r, 1.0);
    /// assert_eq!(red.g, 0.0);
    /// ```
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        let nibbles = digits
            .chars()
            .map(|c| {
                c.to_digit(16).ok_or_else(|| ParseColorError::Digit {
                    input: input.to_string(),
                    found: c,
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;

        let channels: Vec<u8> = match nibbles.len() {
            3 => nibbles.iter().map(|&n| (n * 0x11) as u8).collect(),
            6 => nibbles
                .chunks_exact(2)
                .map(|pair| ((pair[0] << 4) | pair[1]) as u8)
                .collect(),
            digits => {
                return Err(ParseColorError::Length {
                    input: input.to_string(),
                    digits,
                })
            }
        };
        Ok(Self::from_u8(channels[0], channels[1], channels[2]))
    }
}
