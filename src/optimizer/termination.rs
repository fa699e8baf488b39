use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of reasons a search stopped.
///
/// Several criteria can trigger in the same generation, so this is a bit
/// set rather than an enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TerminationFlags(u32);

impl TerminationFlags {
    pub const NONE: Self = Self(0);
    /// Generation budget exhausted
    pub const MAX_ITER: Self = Self(1);
    /// Evaluation budget exhausted
    pub const MAX_FEVALS: Self = Self(1 << 1);
    /// Leading scores no longer spread more than the tolerance
    pub const TOL_FUN: Self = Self(1 << 2);
    /// Search distribution collapsed below the tolerance on every axis
    pub const TOL_X: Self = Self(1 << 3);
    /// Best leading score has not improved over a long window
    pub const STAGNATION: Self = Self(1 << 4);
    /// Covariance matrix condition number exceeded `1e14`
    pub const CONDITION_COV: Self = Self(1 << 5);
    /// Wall-clock budget exhausted
    pub const TIMEOUT: Self = Self(1 << 6);
    /// Nothing to optimize
    pub const NO_VARIABLES: Self = Self(1 << 7);

    const NAMES: [(Self, &'static str); 8] = [
        (Self::MAX_ITER, "MAX_ITER"),
        (Self::MAX_FEVALS, "MAX_FEVALS"),
        (Self::TOL_FUN, "TOL_FUN"),
        (Self::TOL_X, "TOL_X"),
        (Self::STAGNATION, "STAGNATION"),
        (Self::CONDITION_COV, "CONDITION_COV"),
        (Self::TIMEOUT, "TIMEOUT"),
        (Self::NO_VARIABLES, "NO_VARIABLES"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Names of the set flags, in bit order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl BitOr for TerminationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TerminationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Display for TerminationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
