//! Color types and conversion utilities
//!
//! Each color space has its own value type so that a gamma-encoded RGB
//! triple can never be mistaken for tristimulus values or Lab coordinates.
//! Conversions are plain `From` implementations.
//!
//! # Example
//!
//! ```
//! use cielab::{Lab, Rgb, Xyz};
//!
//! let lab = Lab::new(60.0, 20.0, -30.0);
//! let xyz = Xyz::from(lab);
//! let rgb = Rgb::from(xyz);
//!
//! // Back again
//! let back = Lab::from(Xyz::from(rgb));
//! assert!((back.l - lab.l).abs() < 1e-9);
//! ```

mod cmy;
mod lab;
mod lch;
mod rgb;
mod xyz;

pub use cmy::Cmy;
pub use lab::Lab;
pub use lch::Lch;
pub use rgb::Rgb;
pub use xyz::Xyz;
