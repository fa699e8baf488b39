//! Palette search driver
//!
//! Encodes the free colors of a palette as a real vector, `a` and `b` for
//! each free color plus one shared lightness coordinate when the lightness
//! is not fixed, and lets [`Cmaes`] minimize the lexicographic [`fitness`]
//! over it.

use std::fmt;
use std::time::Instant;

use cielab::{Lab, Rgb};
use rayon::prelude::*;

use crate::combinations::CombinationCache;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::fitness::fitness;
use crate::lexi::LexiProduct;
use crate::optimizer::{Cmaes, CmaesOptions, TerminationFlags};

/// Lightness the search starts from when no fixed colors suggest one.
pub const DEFAULT_LIGHTNESS: f64 = 50.0;

/// Outcome of a palette search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Why the search stopped
    pub flags: TerminationFlags,
    /// Lightness of the free colors, fixed or found
    pub lightness: f64,
    /// Largest chroma among the free colors
    pub max_chroma: f64,
    /// Free colors sorted by hue, then the fixed colors
    pub palette: Vec<Lab>,
    pub rgb: Vec<Rgb>,
    pub fitness: LexiProduct,
    pub generations: usize,
    pub evaluations: usize,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "flags: {}", self.flags)?;
        writeln!(f, "lightness: {:.2}", self.lightness)?;
        writeln!(f, "max chroma: {:.2}", self.max_chroma)?;
        write!(f, "rgb:")?;
        for rgb in &self.rgb {
            write!(f, " {rgb}")?;
        }
        writeln!(f)?;
        writeln!(f, "fitness: {:.4}", self.fitness)?;
        write!(
            f,
            "generations: {}, evaluations: {}",
            self.generations, self.evaluations
        )
    }
}

/// Maps optimizer coordinates to palettes.
#[derive(Debug, Clone, Copy)]
struct Decoder<'a> {
    free: usize,
    /// `None` when lightness is the last coordinate
    lightness: Option<f64>,
    fixed: &'a [Lab],
}

impl Decoder<'_> {
    fn lightness(&self, x: &[f64]) -> f64 {
        self.lightness.unwrap_or_else(|| x[2 * self.free])
    }

    fn decode(&self, x: &[f64]) -> Vec<Lab> {
        let l = self.lightness(x);
        (0..self.free)
            .map(|i| Lab::new(l, x[2 * i], x[2 * i + 1]))
            .chain(self.fixed.iter().copied())
            .collect()
    }
}

/// Hue ordering key of the final palette.
fn hue_key(lab: &Lab) -> f64 {
    (-lab.b).atan2(-lab.a)
}

/// Configurable palette search.
///
/// # Example
///
/// ```
/// use segancha::{Searcher, SearchConfig};
///
/// let config = SearchConfig { seed: Some(1), ..Default::default() };
/// let result = Searcher::new(2)
///     .lightness(60.0)
///     .config(config)
///     .quiet(true)
///     .run()
///     .unwrap();
///
/// assert_eq!(result.palette.len(), 2);
/// assert!(!result.flags.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Searcher {
    free: usize,
    lightness: f64,
    max_chroma: f64,
    fixed: Vec<Lab>,
    quiet: bool,
    config: SearchConfig,
}

impl Searcher {
    /// Search for `free` new colors with free lightness and no chroma cap.
    pub fn new(free: usize) -> Self {
        Self {
            free,
            lightness: -1.0,
            max_chroma: -1.0,
            fixed: Vec::new(),
            quiet: false,
            config: SearchConfig::default(),
        }
    }

    /// Lightness shared by all free colors. Negative lets the search pick it.
    pub fn lightness(mut self, lightness: f64) -> Self {
        self.lightness = lightness;
        self
    }

    /// Chroma cap for the free colors. Negative disables the cap.
    pub fn max_chroma(mut self, max_chroma: f64) -> Self {
        self.max_chroma = max_chroma;
        self
    }

    /// Colors the palette must contain unchanged.
    pub fn fixed(mut self, colors: &[Lab]) -> Self {
        self.fixed = colors.to_vec();
        self
    }

    /// Colors the palette must contain, as sRGB hex strings like `#1f77b4`.
    pub fn fixed_hex(self, colors: &[&str]) -> Result<Self, SearchError> {
        let fixed = colors
            .iter()
            .map(|hex| hex.parse::<Rgb>().map(Lab::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.fixed(&fixed))
    }

    /// Suppress progress logging.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.free == 0 && self.fixed.is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "no free and no fixed colors".to_string(),
            ));
        }
        if self.lightness.is_nan() {
            return Err(SearchError::InvalidConfiguration(
                "lightness is NaN".to_string(),
            ));
        }
        if self.max_chroma.is_nan() {
            return Err(SearchError::InvalidConfiguration(
                "max chroma is NaN".to_string(),
            ));
        }
        if let Some(bad) = self
            .fixed
            .iter()
            .find(|c| !(c.l.is_finite() && c.a.is_finite() && c.b.is_finite()))
        {
            return Err(SearchError::InvalidConfiguration(format!(
                "fixed color {bad:?} is not finite"
            )));
        }
        self.config.validate()?;
        Ok(())
    }

    /// Starting lightness: the mean of the fixed colors, else mid-gray.
    fn initial_lightness(&self) -> f64 {
        if self.fixed.is_empty() {
            DEFAULT_LIGHTNESS
        } else {
            self.fixed.iter().map(|c| c.l).sum::<f64>() / self.fixed.len() as f64
        }
    }

    fn options(&self) -> CmaesOptions {
        CmaesOptions {
            population_size: self.config.population_size,
            max_generations: self.config.max_generations,
            max_evaluations: self.config.max_evaluations,
            tol_fun: self.config.tol_fun,
            tol_x: self.config.tol_x,
            seed: self.config.seed,
        }
    }

    /// Run the search to termination.
    pub fn run(&self) -> Result<SearchResult, SearchError> {
        self.validate()?;

        let decoder = Decoder {
            free: self.free,
            lightness: (self.lightness >= 0.0).then_some(self.lightness),
            fixed: &self.fixed,
        };

        let mut x0 = vec![0.0; 2 * self.free];
        let mut steps = vec![self.config.sigma_chroma; 2 * self.free];
        if decoder.lightness.is_none() {
            x0.push(self.initial_lightness());
            steps.push(self.config.sigma_lightness);
        }

        // A lone color has no pair to separate, so it stays neutral gray
        if self.free == 0 || self.free + self.fixed.len() < 2 {
            tracing::debug!(
                free = self.free,
                fixed = self.fixed.len(),
                "Nothing to optimize, scoring starting palette"
            );
            return Ok(self.finish(
                TerminationFlags::NO_VARIABLES,
                decoder.lightness(&x0),
                decoder.decode(&x0),
                0,
                0,
            ));
        }

        let mut es = Cmaes::new(x0, &steps, self.options()).map_err(|source| {
            SearchError::SearchFailed {
                source,
                last_palette: None,
            }
        })?;

        if !self.quiet {
            tracing::info!(
                free = self.free,
                fixed = self.fixed.len(),
                dimensions = es.dim(),
                population = es.population_size(),
                lightness = ?decoder.lightness,
                max_chroma = self.max_chroma,
                "Starting palette search"
            );
        }

        let deadline = self.config.max_duration()?;
        let started = Instant::now();
        let mut cache = CombinationCache::new();

        let flags = loop {
            let mut flags = es.stop();
            if deadline.is_some_and(|limit| started.elapsed() >= limit) {
                flags |= TerminationFlags::TIMEOUT;
            }
            if !flags.is_empty() {
                break flags;
            }

            let last_mean = es.mean().to_vec();
            let candidates = es.ask();
            let scores = self.score(&decoder, &candidates, &mut cache);
            if let Err(source) = es.tell(&candidates, &scores) {
                tracing::warn!(generation = es.generation(), %source, "Optimizer failed");
                return Err(SearchError::SearchFailed {
                    source,
                    last_palette: Some(decoder.decode(&last_mean)),
                });
            }

            let generation = es.generation();
            tracing::debug!(
                generation,
                sigma = es.sigma(),
                best = ?es.best_leading(),
                "Generation scored"
            );
            if !self.quiet && self.config.log_interval > 0 && generation % self.config.log_interval == 0 {
                tracing::info!(
                    generation,
                    evaluations = es.evaluations(),
                    sigma = es.sigma(),
                    best = ?es.best_leading(),
                    "Search progress"
                );
            }
        };

        let mean = es.mean();
        let mut palette = decoder.decode(mean);
        palette[..self.free].sort_by(|x, y| hue_key(x).total_cmp(&hue_key(y)));

        Ok(self.finish(
            flags,
            decoder.lightness(mean),
            palette,
            es.generation(),
            es.evaluations(),
        ))
    }

    /// Score a population, in parallel when configured.
    fn score(
        &self,
        decoder: &Decoder<'_>,
        candidates: &[Vec<f64>],
        cache: &mut CombinationCache,
    ) -> Vec<LexiProduct> {
        if self.config.parallel {
            candidates
                .par_iter()
                .map_init(CombinationCache::new, |cache, x| {
                    fitness(&decoder.decode(x), self.free, self.max_chroma, cache)
                })
                .collect()
        } else {
            candidates
                .iter()
                .map(|x| fitness(&decoder.decode(x), self.free, self.max_chroma, cache))
                .collect()
        }
    }

    fn finish(
        &self,
        flags: TerminationFlags,
        lightness: f64,
        palette: Vec<Lab>,
        generations: usize,
        evaluations: usize,
    ) -> SearchResult {
        let fitness = fitness(&palette, self.free, self.max_chroma, &mut CombinationCache::new());
        let max_chroma = palette[..self.free]
            .iter()
            .map(|c| c.chroma())
            .fold(0.0, f64::max);
        let rgb = palette.iter().map(|&c| Rgb::from(c)).collect();

        if !self.quiet {
            tracing::info!(
                %flags,
                generations,
                evaluations,
                lightness,
                max_chroma,
                worst = ?fitness.worst(),
                "Palette search finished"
            );
        }

        SearchResult {
            flags,
            lightness,
            max_chroma,
            palette,
            rgb,
            fitness,
            generations,
            evaluations,
        }
    }
}

/// Search for `free` colors that are as distinguishable as possible from
/// each other and from `fixed`.
///
/// Negative `lightness` lets the search choose one lightness for all free
/// colors; negative `max_chroma` disables the chroma cap.
pub fn search(
    free: usize,
    lightness: f64,
    max_chroma: f64,
    fixed: Option<&[Lab]>,
    quiet: bool,
) -> Result<SearchResult, SearchError> {
    Searcher::new(free)
        .lightness(lightness)
        .max_chroma(max_chroma)
        .fixed(fixed.unwrap_or_default())
        .quiet(quiet)
        .run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_fixed_lightness() {
        let fixed = [Lab::new(30.0, 1.0, 2.0)];
        let decoder = Decoder {
            free: 2,
            lightness: Some(70.0),
            fixed: &fixed,
        };
        assert_eq!(
            decoder.decode(&[1.0, 2.0, 3.0, 4.0]),
            vec![
                Lab::new(70.0, 1.0, 2.0),
                Lab::new(70.0, 3.0, 4.0),
                Lab::new(30.0, 1.0, 2.0),
            ]
        );
    }

    #[test]
    fn test_decode_free_lightness() {
        let decoder = Decoder {
            free: 1,
            lightness: None,
            fixed: &[],
        };
        assert_eq!(decoder.decode(&[5.0, -5.0, 42.0]), vec![Lab::new(42.0, 5.0, -5.0)]);
        assert_eq!(decoder.lightness(&[5.0, -5.0, 42.0]), 42.0);
    }

    #[test]
    fn test_hue_order() {
        // atan2(-b, -a) starts just below a > 0, b = 0 and runs through yellow, green, blue
        let mut colors = vec![
            Lab::new(50.0, -10.0, 0.0),
            Lab::new(50.0, 0.0, 10.0),
            Lab::new(50.0, 10.0, 1e-9),
            Lab::new(50.0, 0.0, -10.0),
        ];
        colors.sort_by(|x, y| hue_key(x).total_cmp(&hue_key(y)));
        assert_eq!(colors[0].a, 10.0);
        assert_eq!(colors[1].b, 10.0);
        assert_eq!(colors[2].a, -10.0);
        assert_eq!(colors[3].b, -10.0);
    }

    #[test]
    fn test_initial_lightness() {
        assert_eq!(Searcher::new(1).initial_lightness(), DEFAULT_LIGHTNESS);
        let searcher =
            Searcher::new(1).fixed(&[Lab::new(20.0, 0.0, 0.0), Lab::new(80.0, 5.0, 5.0)]);
        assert_eq!(searcher.initial_lightness(), 50.0);
        let searcher = Searcher::new(1).fixed(&[Lab::new(30.0, 0.0, 0.0)]);
        assert_eq!(searcher.initial_lightness(), 30.0);
    }

    #[test]
    fn test_nothing_to_search() {
        let result = Searcher::new(0).quiet(true).run();
        assert!(matches!(result, Err(SearchError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_nan_arguments_rejected() {
        let result = Searcher::new(1).lightness(f64::NAN).quiet(true).run();
        assert!(matches!(result, Err(SearchError::InvalidConfiguration(_))));
        let result = Searcher::new(1).max_chroma(f64::NAN).quiet(true).run();
        assert!(matches!(result, Err(SearchError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig {
            sigma_chroma: -1.0,
            ..Default::default()
        };
        let result = Searcher::new(2).config(config).quiet(true).run();
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn test_fixed_lightness_search() {
        let config = SearchConfig {
            seed: Some(2),
            max_generations: 3,
            ..Default::default()
        };
        let result = Searcher::new(2)
            .lightness(50.0)
            .config(config)
            .quiet(true)
            .run()
            .unwrap();

        assert_eq!(result.generations, 3);
        assert_eq!(result.lightness, 50.0);
        assert!(result.palette.iter().all(|c| c.l == 50.0));
    }

    #[test]
    fn test_unrepresentable_duration_rejected() {
        let config = SearchConfig {
            max_duration_secs: Some(1e30),
            ..Default::default()
        };
        let result = Searcher::new(2).config(config).quiet(true).run();
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn test_single_color_is_not_optimized() {
        let result = Searcher::new(1).quiet(true).run().unwrap();

        assert_eq!(result.flags, TerminationFlags::NO_VARIABLES);
        assert_eq!(result.palette, vec![Lab::new(DEFAULT_LIGHTNESS, 0.0, 0.0)]);
        assert_eq!(result.lightness, DEFAULT_LIGHTNESS);
        assert!(result.fitness.is_empty());
        assert_eq!(result.generations, 0);

        let result = Searcher::new(1).lightness(80.0).quiet(true).run().unwrap();
        assert_eq!(result.palette, vec![Lab::new(80.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_optimizer_failure_reports_last_palette() {
        // Steps this large overflow the samples, so the first update blows up sigma
        let config = SearchConfig {
            seed: Some(4),
            sigma_chroma: f64::MAX,
            parallel: false,
            ..Default::default()
        };
        let result = Searcher::new(4)
            .lightness(50.0)
            .config(config)
            .quiet(true)
            .run();

        match result {
            Err(SearchError::SearchFailed {
                source,
                last_palette: Some(palette),
            }) => {
                assert_eq!(source.to_string(), "step size is not finite");
                assert_eq!(palette, vec![Lab::new(50.0, 0.0, 0.0); 4]);
            }
            other => panic!("Expected SearchFailed with a palette, got {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let palette = vec![Lab::new(50.0, 0.0, 0.0)];
        let result = SearchResult {
            flags: TerminationFlags::TOL_FUN,
            lightness: 50.0,
            max_chroma: 0.0,
            rgb: palette.iter().map(|&c| Rgb::from(c)).collect(),
            palette,
            fitness: LexiProduct::from(vec![-12.5]),
            generations: 3,
            evaluations: 24,
        };
        let text = result.to_string();
        assert!(text.starts_with("flags: TOL_FUN\n"));
        assert!(text.contains("lightness: 50.00\n"));
        assert!(text.contains("rgb: #777777\n"));
        assert!(text.contains("fitness: [-12.5000]\n"));
        assert!(text.ends_with("generations: 3, evaluations: 24"));
    }
}
