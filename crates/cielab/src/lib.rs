// Colorimetric constants are quoted at full published precision.
#![allow(clippy::excessive_precision, clippy::manual_range_contains)]

//! cielab: CIELAB color math for palette search
//!
//! This library provides the color-space transforms, the CIEDE2000 color
//! difference and the gamut penalties that a palette optimizer needs to
//! score candidate colors.
//!
//! # Quick Start
//!
//! ```
//! use cielab::{ciede2000, off_rgb, Lab};
//!
//! let grey = Lab::new(50.0, 0.0, 0.0);
//! let teal = Lab::new(50.0, -20.0, -10.0);
//!
//! // Both colors are displayable on an sRGB screen
//! assert_eq!(off_rgb(grey), 0.0);
//! assert_eq!(off_rgb(teal), 0.0);
//!
//! // and clearly distinguishable
//! assert!(ciede2000(grey, teal) > 10.0);
//! ```
//!
//! # Color Spaces
//!
//! | Type | Key Property | Used For |
//! |------|--------------|----------|
//! | [`Lab`] | Perceptual coordinates (CIE 1976 L\*a\*b\*, D65) | Optimization variables, color difference |
//! | [`Lch`] | Polar form of Lab | Chroma caps, hue ordering, chroma search |
//! | [`Xyz`] | Device-independent tristimulus values | Hub between Lab and RGB |
//! | [`Rgb`] | Gamma-encoded sRGB | Screen gamut check, output |
//! | [`Cmy`] | Subtractive complement of RGB | Print gamut check |
//!
//! Every transform is total: a Lab color far outside the visible range still
//! converts, it just lands outside `0.0..=1.0` in RGB. The gamut functions in
//! [`gamut`] measure exactly how far.
//!
//! ## Pipeline
//!
//! ```text
//! Lab ──> Xyz ──> linear RGB ──(compand)──> Rgb ──> Cmy
//!  │                                         │
//!  └─ Lch                                    └─ off_rgb(): distance outside the cube
//! ```
//!
//! ## Distance Metric: CIEDE2000
//!
//! [`ciede2000`] is the `palette` crate's CIE Technical Report 142-2001 formula with unit
//! parametric factors. It is symmetric, non-negative and zero for identical
//! colors. Unlike Euclidean distance in Lab it compresses differences among
//! highly chromatic colors, which is what keeps an optimizer from simply
//! pushing every color to the gamut corners.

pub mod color;
pub mod difference;
pub mod error;
pub mod gamut;

pub use color::{Cmy, Lab, Lch, Rgb, Xyz};
pub use difference::ciede2000;
pub use error::ParseColorError;
pub use gamut::{in_gamut, max_chroma, off_chroma, off_rgb};
