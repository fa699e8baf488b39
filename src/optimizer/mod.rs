//! Derivative-free minimization
//!
//! A covariance matrix adaptation evolution strategy (CMA-ES) driven through
//! an ask/tell protocol: the caller asks for a population of candidate
//! points, scores them however it likes and tells the scores back. Scores
//! only need a partial order, which lets lexicographic fitness vectors
//! steer the search directly.

mod cmaes;
mod termination;

pub use cmaes::{Cmaes, CmaesOptions};
pub use termination::TerminationFlags;

use thiserror::Error;

/// A score the optimizer can rank.
///
/// Ranking uses `PartialOrd`; `leading` is the scalar summary used by the
/// tolerance and stagnation criteria.
pub trait Objective: PartialOrd {
    fn leading(&self) -> f64;
}

impl Objective for f64 {
    fn leading(&self) -> f64 {
        *self
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("expected {expected} candidates, got {got}")]
    PopulationMismatch { expected: usize, got: usize },

    #[error("expected {expected} coordinates, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("initial step sizes must be positive and finite")]
    InvalidInitialStep,

    #[error("step size is not finite")]
    NonFiniteStepSize,

    #[error("covariance matrix is degenerate")]
    DegenerateCovariance,

    #[error("eigendecomposition of the covariance matrix did not converge")]
    EigenDecomposition,
}
