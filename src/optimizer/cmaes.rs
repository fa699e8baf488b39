use std::cmp::Ordering;
use std::collections::VecDeque;

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::{Objective, OptimizerError, TerminationFlags};

/// Covariance condition number above which the search stops.
const MAX_CONDITION: f64 = 1e14;

/// Iteration cap for the symmetric eigensolver.
const EIGEN_MAX_ITERATIONS: usize = 10_000;

/// Eigenvalues are floored here to keep the sampling basis usable.
const EIGEN_FLOOR: f64 = 1e-20;

/// Budgets and tolerances of a [`Cmaes`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct CmaesOptions {
    /// Candidates per generation, `4 + 3 ln n` when absent
    pub population_size: Option<usize>,
    pub max_generations: usize,
    pub max_evaluations: Option<usize>,
    pub tol_fun: f64,
    pub tol_x: f64,
    /// Seed for the sampling RNG, entropy when absent
    pub seed: Option<u64>,
}

impl Default for CmaesOptions {
    fn default() -> Self {
        Self {
            population_size: None,
            max_generations: 5000,
            max_evaluations: None,
            tol_fun: 1e-10,
            tol_x: 1e-10,
            seed: None,
        }
    }
}

/// Strategy parameters derived from the dimension and population size.
#[derive(Debug, Clone)]
struct Parameters {
    lambda: usize,
    /// Recombination weights of the `mu` best candidates, summing to one
    weights: Vec<f64>,
    mueff: f64,
    cc: f64,
    cs: f64,
    c1: f64,
    cmu: f64,
    damps: f64,
}

impl Parameters {
    fn new(n: usize, population_size: Option<usize>) -> Self {
        let n_f = n as f64;
        let lambda = population_size
            .unwrap_or_else(|| (4.0 + (3.0 * n_f.ln()).floor()).max(2.0) as usize)
            .max(2);
        let mu = lambda / 2;

        let base = (lambda as f64 + 1.0) / 2.0;
        let raw: Vec<f64> = (0..mu).map(|i| base.ln() - ((i + 1) as f64).ln()).collect();
        let total: f64 = raw.iter().sum();
        let weights: Vec<f64> = raw.iter().map(|w| w / total).collect();
        let mueff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let cc = (4.0 + mueff / n_f) / (n_f + 4.0 + 2.0 * mueff / n_f);
        let cs = (mueff + 2.0) / (n_f + mueff + 5.0);
        let c1 = 2.0 / ((n_f + 1.3).powi(2) + mueff);
        let cmu = (2.0 * (mueff - 2.0 + 1.0 / mueff) / ((n_f + 2.0).powi(2) + mueff)).min(1.0 - c1);
        let damps = 2.0 * mueff / lambda as f64 + 0.3 + cs;

        Self {
            lambda,
            weights,
            mueff,
            cc,
            cs,
            c1,
            cmu,
            damps,
        }
    }
}

/// Covariance matrix adaptation evolution strategy.
///
/// Minimizes through [`ask`](Self::ask) and [`tell`](Self::tell). Candidates
/// are ranked with their scores' partial order, so any [`Objective`] works,
/// including lexicographic vectors.
///
/// ```
/// use segancha::optimizer::{Cmaes, CmaesOptions};
///
/// let options = CmaesOptions { seed: Some(3), ..Default::default() };
/// let mut es = Cmaes::new(vec![2.0, -1.0], &[1.0, 1.0], options).unwrap();
/// while es.stop().is_empty() {
///     let candidates = es.ask();
///     let scores: Vec<f64> = candidates.iter().map(|x| x.iter().map(|v| v * v).sum()).collect();
///     es.tell(&candidates, &scores).unwrap();
/// }
/// assert!(es.mean().iter().all(|v| v.abs() < 1e-3));
/// ```
#[derive(Debug, Clone)]
pub struct Cmaes {
    dim: usize,
    params: Parameters,
    options: CmaesOptions,
    rng: StdRng,
    mean: DVector<f64>,
    sigma: f64,
    cov: DMatrix<f64>,
    /// Eigenvectors of `cov`, one per column
    basis: DMatrix<f64>,
    /// Square roots of the eigenvalues of `cov`
    scales: DVector<f64>,
    condition: f64,
    pc: DVector<f64>,
    ps: DVector<f64>,
    generation: usize,
    evaluations: usize,
    /// Leading scores of the last generation, best first
    last_leading: Vec<f64>,
    /// Best leading score of each recent generation
    best_history: VecDeque<f64>,
    /// Best leading score seen so far, after each recent generation
    best_so_far: VecDeque<f64>,
}

impl Cmaes {
    /// Start a search at `x0` with a per-coordinate initial step size.
    pub fn new(x0: Vec<f64>, steps: &[f64], options: CmaesOptions) -> Result<Self, OptimizerError> {
        let dim = x0.len();
        if steps.len() != dim {
            return Err(OptimizerError::DimensionMismatch {
                expected: dim,
                got: steps.len(),
            });
        }
        if steps.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(OptimizerError::InvalidInitialStep);
        }

        // Overall step size is the largest one; the covariance carries the ratios
        let sigma = if dim == 0 {
            1.0
        } else {
            steps.iter().copied().fold(0.0, f64::max)
        };
        let scales = DVector::from_iterator(dim, steps.iter().map(|s| s / sigma));
        let cov = DMatrix::from_diagonal(&scales.map(|d| d * d));
        let condition = if dim == 0 {
            1.0
        } else {
            let (lo, hi) = scales
                .iter()
                .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &d| (lo.min(d), hi.max(d)));
            (hi / lo).powi(2)
        };

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            dim,
            params: Parameters::new(dim, options.population_size),
            options,
            rng,
            mean: DVector::from_vec(x0),
            sigma,
            cov,
            basis: DMatrix::identity(dim, dim),
            scales,
            condition,
            pc: DVector::zeros(dim),
            ps: DVector::zeros(dim),
            generation: 0,
            evaluations: 0,
            last_leading: Vec::new(),
            best_history: VecDeque::new(),
            best_so_far: VecDeque::new(),
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn population_size(&self) -> usize {
        self.params.lambda
    }

    /// Current distribution mean.
    pub fn mean(&self) -> &[f64] {
        self.mean.as_slice()
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn condition_number(&self) -> f64 {
        self.condition
    }

    /// Standard deviation of the search distribution along each coordinate.
    pub fn step_sizes(&self) -> Vec<f64> {
        self.cov
            .diagonal()
            .iter()
            .map(|c| self.sigma * c.max(0.0).sqrt())
            .collect()
    }

    /// Best leading score of the last generation.
    pub fn best_leading(&self) -> Option<f64> {
        self.last_leading.first().copied()
    }

    /// Sample a new population.
    pub fn ask(&mut self) -> Vec<Vec<f64>> {
        let mut population = Vec::with_capacity(self.params.lambda);
        for _ in 0..self.params.lambda {
            population.push(self.sample());
        }
        population
    }

    fn sample(&mut self) -> Vec<f64> {
        let rng = &mut self.rng;
        let z = DVector::<f64>::from_fn(self.dim, |_, _| rng.sample(StandardNormal));
        let y = &self.basis * self.scales.component_mul(&z);
        (&self.mean + y * self.sigma).as_slice().to_vec()
    }

    /// Update the distribution from a scored population.
    ///
    /// `candidates` must be the last population returned by
    /// [`ask`](Self::ask), possibly reordered together with `scores`.
    pub fn tell<S: Objective>(
        &mut self,
        candidates: &[Vec<f64>],
        scores: &[S],
    ) -> Result<(), OptimizerError> {
        let lambda = self.params.lambda;
        for got in [candidates.len(), scores.len()] {
            if got != lambda {
                return Err(OptimizerError::PopulationMismatch {
                    expected: lambda,
                    got,
                });
            }
        }
        if let Some(bad) = candidates.iter().find(|x| x.len() != self.dim) {
            return Err(OptimizerError::DimensionMismatch {
                expected: self.dim,
                got: bad.len(),
            });
        }

        let order = rank(scores);
        self.generation += 1;
        self.evaluations += lambda;

        let n = self.dim as f64;
        let Parameters {
            ref weights,
            mueff,
            cc,
            cs,
            c1,
            cmu,
            damps,
            ..
        } = self.params;

        // Steps of the selected candidates, in units of sigma
        let old_mean = self.mean.clone();
        let selected: Vec<DVector<f64>> = order
            .iter()
            .take(weights.len())
            .map(|&k| (DVector::from_column_slice(&candidates[k]) - &old_mean) / self.sigma)
            .collect();
        let y_w = selected
            .iter()
            .zip(weights)
            .fold(DVector::<f64>::zeros(self.dim), |acc, (y, w)| acc + y * *w);
        self.mean = &old_mean + &y_w * self.sigma;

        // Cumulative step-size adaptation
        let inv_sqrt = &self.basis
            * DMatrix::from_diagonal(&self.scales.map(|d| 1.0 / d))
            * self.basis.transpose();
        self.ps = &self.ps * (1.0 - cs) + (inv_sqrt * &y_w) * (cs * (2.0 - cs) * mueff).sqrt();
        let ps_sq = self.ps.norm_squared();

        let decay = 1.0 - (1.0 - cs).powf(2.0 * self.generation as f64);
        let hsig = if decay > 0.0 && ps_sq / n / decay < 2.0 + 4.0 / (n + 1.0) {
            1.0
        } else {
            0.0
        };
        self.pc = &self.pc * (1.0 - cc) + &y_w * (hsig * (cc * (2.0 - cc) * mueff).sqrt());

        // Rank-one and rank-mu covariance update
        let c1a = c1 * (1.0 - (1.0 - hsig * hsig) * cc * (2.0 - cc));
        let rank_mu = selected
            .iter()
            .zip(weights)
            .fold(DMatrix::<f64>::zeros(self.dim, self.dim), |acc, (y, w)| {
                acc + y * y.transpose() * *w
            });
        self.cov = &self.cov * (1.0 - c1a - cmu) + &self.pc * self.pc.transpose() * c1 + rank_mu * cmu;

        self.sigma *= (cs / damps * (ps_sq / n - 1.0) / 2.0).min(1.0).exp();
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(OptimizerError::NonFiniteStepSize);
        }

        self.update_eigensystem()?;
        self.record(order.iter().map(|&k| scores[k].leading()).collect());
        Ok(())
    }

    fn update_eigensystem(&mut self) -> Result<(), OptimizerError> {
        let cov = (&self.cov + self.cov.transpose()) * 0.5;
        if cov.iter().any(|v| !v.is_finite()) {
            return Err(OptimizerError::DegenerateCovariance);
        }

        let eigen = SymmetricEigen::try_new(cov.clone(), f64::EPSILON, EIGEN_MAX_ITERATIONS)
            .ok_or(OptimizerError::EigenDecomposition)?;
        let largest = eigen.eigenvalues.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if largest.is_nan() || largest <= 0.0 {
            return Err(OptimizerError::DegenerateCovariance);
        }

        let smallest = eigen.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
        if smallest < EIGEN_FLOOR {
            tracing::debug!(smallest, largest, "Flooring covariance eigenvalues");
        }
        let floored = eigen.eigenvalues.map(|v| v.max(EIGEN_FLOOR));

        self.condition = largest / smallest.max(EIGEN_FLOOR);
        self.scales = floored.map(f64::sqrt);
        self.basis = eigen.eigenvectors;
        self.cov = cov;
        Ok(())
    }

    fn record(&mut self, leading: Vec<f64>) {
        let best = leading.first().copied().unwrap_or(f64::INFINITY);
        let best_so_far = self.best_so_far.back().map_or(best, |&b| b.min(best));

        self.best_history.push_back(best);
        if self.best_history.len() > self.tol_fun_window() {
            self.best_history.pop_front();
        }
        self.best_so_far.push_back(best_so_far);
        if self.best_so_far.len() > self.stagnation_window() + 1 {
            self.best_so_far.pop_front();
        }
        self.last_leading = leading;
    }

    fn spread_window(&self) -> usize {
        (30.0 * self.dim as f64 / self.params.lambda as f64).ceil() as usize
    }

    fn tol_fun_window(&self) -> usize {
        10 + self.spread_window()
    }

    fn stagnation_window(&self) -> usize {
        120 + self.spread_window()
    }

    /// Termination criteria currently met. Empty while the search should go on.
    pub fn stop(&self) -> TerminationFlags {
        let mut flags = TerminationFlags::NONE;
        if self.dim == 0 {
            flags |= TerminationFlags::NO_VARIABLES;
            return flags;
        }

        if self.generation >= self.options.max_generations {
            flags |= TerminationFlags::MAX_ITER;
        }
        if let Some(max) = self.options.max_evaluations {
            if self.evaluations >= max {
                flags |= TerminationFlags::MAX_FEVALS;
            }
        }
        if self.generation == 0 {
            return flags;
        }

        if self.best_history.len() >= self.tol_fun_window() {
            let (lo, hi) = self
                .last_leading
                .iter()
                .chain(&self.best_history)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            if hi - lo < self.options.tol_fun {
                flags |= TerminationFlags::TOL_FUN;
            }
        }

        let tol_x = self.options.tol_x;
        let collapsed = self
            .step_sizes()
            .iter()
            .zip(self.pc.iter())
            .all(|(step, pc)| *step < tol_x && self.sigma * pc.abs() < tol_x);
        if collapsed {
            flags |= TerminationFlags::TOL_X;
        }

        if self.best_so_far.len() > self.stagnation_window() {
            if let (Some(oldest), Some(newest)) = (self.best_so_far.front(), self.best_so_far.back()) {
                if oldest - newest <= self.options.tol_fun {
                    flags |= TerminationFlags::STAGNATION;
                }
            }
        }

        if self.condition > MAX_CONDITION {
            flags |= TerminationFlags::CONDITION_COV;
        }

        flags
    }
}

/// Indices of `scores` from best to worst. Scores that are not comparable
/// with themselves (NaN somewhere) rank last; ties keep their order.
fn rank<S: PartialOrd>(scores: &[S]) -> Vec<usize> {
    let (mut ordered, unordered): (Vec<usize>, Vec<usize>) =
        (0..scores.len()).partition(|&k| scores[k].partial_cmp(&scores[k]).is_some());
    ordered.sort_by(|&x, &y| scores[x].partial_cmp(&scores[y]).unwrap_or(Ordering::Equal));
    ordered.extend(unordered);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexi::LexiProduct;
    use pretty_assertions::assert_eq;

    fn sphere(x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn seeded(seed: u64) -> CmaesOptions {
        CmaesOptions {
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn run<S: Objective>(es: &mut Cmaes, f: impl Fn(&[f64]) -> S) -> TerminationFlags {
        loop {
            let flags = es.stop();
            if !flags.is_empty() {
                return flags;
            }
            let candidates = es.ask();
            let scores: Vec<S> = candidates.iter().map(|x| f(x)).collect();
            es.tell(&candidates, &scores).unwrap();
        }
    }

    #[test]
    fn test_default_population_size() {
        let es = Cmaes::new(vec![0.0; 4], &[1.0; 4], CmaesOptions::default()).unwrap();
        assert_eq!(es.population_size(), 8);

        let es = Cmaes::new(vec![0.0; 10], &[1.0; 10], CmaesOptions::default()).unwrap();
        assert_eq!(es.population_size(), 10);
    }

    #[test]
    fn test_population_size_override() {
        let options = CmaesOptions {
            population_size: Some(20),
            ..Default::default()
        };
        let mut es = Cmaes::new(vec![0.0; 3], &[1.0; 3], options).unwrap();
        assert_eq!(es.ask().len(), 20);
    }

    #[test]
    fn test_minimizes_sphere() {
        let mut es = Cmaes::new(vec![3.0, -2.0, 1.0], &[1.0; 3], seeded(1)).unwrap();
        let flags = run(&mut es, sphere);

        assert!(!flags.contains(TerminationFlags::MAX_ITER), "flags: {flags}");
        assert!(sphere(es.mean()) < 1e-6, "mean {:?}", es.mean());
    }

    #[test]
    fn test_minimizes_lexicographic_objective() {
        let mut es = Cmaes::new(vec![2.0, -3.0], &[1.0; 2], seeded(5)).unwrap();
        run(&mut es, |x| {
            let mut values = vec![x[0] * x[0], x[1] * x[1]];
            values.sort_by(|a, b| b.total_cmp(a));
            LexiProduct::from(values)
        });

        assert!(es.mean().iter().all(|v| v.abs() < 1e-3), "mean {:?}", es.mean());
    }

    #[test]
    fn test_same_seed_same_samples() {
        let mut a = Cmaes::new(vec![1.0, 2.0], &[0.5, 0.5], seeded(42)).unwrap();
        let mut b = Cmaes::new(vec![1.0, 2.0], &[0.5, 0.5], seeded(42)).unwrap();
        assert_eq!(a.ask(), b.ask());
    }

    #[test]
    fn test_per_coordinate_steps() {
        let es = Cmaes::new(vec![0.0, 0.0, 50.0], &[20.0, 20.0, 10.0], seeded(0)).unwrap();
        assert_eq!(es.sigma(), 20.0);
        let steps = es.step_sizes();
        assert!((steps[0] - 20.0).abs() < 1e-12);
        assert!((steps[2] - 10.0).abs() < 1e-12);
        assert!((es.condition_number() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_initial_steps() {
        assert_eq!(
            Cmaes::new(vec![0.0, 0.0], &[1.0], seeded(0)).unwrap_err(),
            OptimizerError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );
        assert_eq!(
            Cmaes::new(vec![0.0], &[0.0], seeded(0)).unwrap_err(),
            OptimizerError::InvalidInitialStep
        );
        assert_eq!(
            Cmaes::new(vec![0.0], &[f64::NAN], seeded(0)).unwrap_err(),
            OptimizerError::InvalidInitialStep
        );
    }

    #[test]
    fn test_tell_rejects_wrong_population() {
        let mut es = Cmaes::new(vec![0.0; 2], &[1.0; 2], seeded(0)).unwrap();
        let mut candidates = es.ask();
        candidates.pop();
        let scores: Vec<f64> = candidates.iter().map(|x| sphere(x)).collect();

        let lambda = es.population_size();
        assert_eq!(
            es.tell(&candidates, &scores).unwrap_err(),
            OptimizerError::PopulationMismatch {
                expected: lambda,
                got: lambda - 1
            }
        );
        assert_eq!(es.generation(), 0);
    }

    #[test]
    fn test_generation_budget() {
        let options = CmaesOptions {
            max_generations: 3,
            max_evaluations: Some(1_000_000),
            ..seeded(9)
        };
        let mut es = Cmaes::new(vec![5.0; 2], &[1.0; 2], options).unwrap();
        let flags = run(&mut es, sphere);

        assert_eq!(flags, TerminationFlags::MAX_ITER);
        assert_eq!(es.generation(), 3);
        assert_eq!(es.evaluations(), 3 * es.population_size());
    }

    #[test]
    fn test_evaluation_budget() {
        let options = CmaesOptions {
            max_evaluations: Some(20),
            ..seeded(9)
        };
        let mut es = Cmaes::new(vec![5.0; 2], &[1.0; 2], options).unwrap();
        let flags = run(&mut es, sphere);

        assert!(flags.contains(TerminationFlags::MAX_FEVALS));
        assert!(es.evaluations() >= 20);
    }

    #[test]
    fn test_flat_objective_stops() {
        let mut es = Cmaes::new(vec![0.0; 2], &[1.0; 2], seeded(2)).unwrap();
        let flags = run(&mut es, |_| 1.0_f64);
        assert!(flags.contains(TerminationFlags::TOL_FUN), "flags: {flags}");
        assert_eq!(es.generation(), es.tol_fun_window());
    }

    #[test]
    fn test_no_variables() {
        let es = Cmaes::new(Vec::new(), &[], seeded(0)).unwrap();
        assert_eq!(es.stop(), TerminationFlags::NO_VARIABLES);
    }

    #[test]
    fn test_rank_puts_nan_last() {
        assert_eq!(rank(&[3.0, f64::NAN, 1.0, 2.0]), vec![2, 3, 0, 1]);
        assert_eq!(rank(&[1.0, 1.0, 0.0]), vec![2, 0, 1]);
    }
}
