//! Lexicographically ordered score vectors
//!
//! A [`LexiProduct`] holds one score per color pair, sorted so that the worst
//! conflict comes first. Comparing two of them compares the worst conflicts
//! first, then the second worst, and so on. This lets the optimizer improve
//! the weakest pair without a weighted sum ever trading it off against
//! pairs that are already well separated.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Index, Sub};

use crate::optimizer::Objective;

/// A vector of scores compared lexicographically.
///
/// Smaller is better. Two products are compared position by position and the
/// first differing position decides. When one product is a prefix of the
/// other, the longer one compares greater (`[5] < [5, 0]`).
///
/// A bare `f64` compares like a product of length one.
///
/// ```
/// use segancha::LexiProduct;
///
/// let a = LexiProduct::from(vec![5.0, 1.0]);
/// let b = LexiProduct::from(vec![5.0, 2.0]);
/// assert!(a < b);
///
/// assert!(LexiProduct::from(vec![5.0]) < LexiProduct::from(vec![5.0, 0.0]));
/// assert!(LexiProduct::from(vec![4.0, 100.0]) < 5.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LexiProduct {
    values: Vec<f64>,
}

impl LexiProduct {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    /// The leading (worst) score, if any.
    pub fn worst(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }

    /// Signed comparison value: the difference at the first unequal position,
    /// or the length difference when the common prefix is equal. NaN when a
    /// compared position holds NaN.
    fn difference(lhs: &[f64], rhs: &[f64]) -> f64 {
        for (x, y) in lhs.iter().zip(rhs) {
            // Checked before subtracting so equal infinities count as equal
            if x != y {
                return x - y;
            }
        }
        lhs.len() as f64 - rhs.len() as f64
    }
}

impl From<Vec<f64>> for LexiProduct {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<f64> for LexiProduct {
    fn from(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl PartialEq for LexiProduct {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for LexiProduct {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Self::difference(&self.values, &other.values).partial_cmp(&0.0)
    }
}

impl PartialEq<f64> for LexiProduct {
    fn eq(&self, other: &f64) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd<f64> for LexiProduct {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        Self::difference(&self.values, std::slice::from_ref(other)).partial_cmp(&0.0)
    }
}

impl PartialEq<LexiProduct> for f64 {
    fn eq(&self, other: &LexiProduct) -> bool {
        other == self
    }
}

impl PartialOrd<LexiProduct> for f64 {
    fn partial_cmp(&self, other: &LexiProduct) -> Option<Ordering> {
        other.partial_cmp(self).map(Ordering::reverse)
    }
}

impl Sub for &LexiProduct {
    type Output = LexiProduct;

    /// Element-wise difference, truncated to the shorter operand.
    fn sub(self, rhs: &LexiProduct) -> LexiProduct {
        LexiProduct::new(
            self.values
                .iter()
                .zip(&rhs.values)
                .map(|(x, y)| x - y)
                .collect(),
        )
    }
}

impl Sub for LexiProduct {
    type Output = LexiProduct;

    fn sub(self, rhs: LexiProduct) -> LexiProduct {
        &self - &rhs
    }
}

impl Index<usize> for LexiProduct {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl<'a> IntoIterator for &'a LexiProduct {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for LexiProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match f.precision() {
                Some(precision) => write!(f, "{value:.precision$}")?,
                None => write!(f, "{value}")?,
            }
        }
        f.write_str("]")
    }
}

impl Objective for LexiProduct {
    /// The worst conflict; positive infinity for an empty product.
    fn leading(&self) -> f64 {
        self.worst().unwrap_or(f64::INFINITY)
    }
}
