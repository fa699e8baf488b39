//! Palette scoring
//!
//! A palette is scored by one number per compared pair: the pair's penalties
//! minus its CIEDE2000 distance. The scores are sorted worst first and
//! wrapped in a [`LexiProduct`], so minimizing the fitness first pushes the
//! closest pair apart, then the next closest, and so on.

use cielab::{ciede2000, off_chroma, off_rgb, Lab};

use crate::combinations::CombinationCache;
use crate::lexi::LexiProduct;

/// Weight of the gamut penalty relative to the chroma penalty. Large enough
/// that leaving the gamut never pays off in distance.
pub const GAMUT_WEIGHT: f64 = 300.0;

/// Penalty of a single free color in a palette of `total` colors.
///
/// Scaled by `total` so that one color's violation outweighs the distance it
/// gains against every other color.
pub fn penalty(color: Lab, max_chroma: f64, total: usize) -> f64 {
    (off_rgb(color) * GAMUT_WEIGHT + off_chroma(color, max_chroma)) * total as f64
}

/// Score `colors`, of which the first `free` are free and the rest fixed.
///
/// Fixed colors carry no penalty. With `free == 0` every pair of colors is
/// compared and the result is just the negated distances.
pub fn fitness(
    colors: &[Lab],
    free: usize,
    max_chroma: f64,
    cache: &mut CombinationCache,
) -> LexiProduct {
    let total = colors.len();
    let penalties: Vec<f64> = colors
        .iter()
        .enumerate()
        .map(|(i, &color)| {
            if i < free {
                penalty(color, max_chroma, total)
            } else {
                0.0
            }
        })
        .collect();

    let scores: Vec<f64> = cache
        .pairs(total, free)
        .iter()
        .map(|&(i, j)| penalties[i] + penalties[j] - ciede2000(colors[i], colors[j]))
        .collect();

    LexiProduct::new(cache.sort_descending(&scores))
}
