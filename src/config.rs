use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Tuning knobs for the palette search, loaded from YAML
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Candidates per generation (CMA-ES default `4 + 3 ln n` when absent)
    pub population_size: Option<usize>,

    /// Generation budget
    pub max_generations: usize,

    /// Fitness evaluation budget
    pub max_evaluations: Option<usize>,

    /// Tolerance on the spread of the worst-conflict score
    pub tol_fun: f64,

    /// Tolerance on the search distribution's step sizes
    pub tol_x: f64,

    /// Initial step size for the a and b coordinates
    pub sigma_chroma: f64,

    /// Initial step size for the shared lightness coordinate
    pub sigma_lightness: f64,

    /// RNG seed for reproducible runs
    pub seed: Option<u64>,

    /// Score population members on the rayon thread pool
    pub parallel: bool,

    /// Wall-clock budget in seconds
    pub max_duration_secs: Option<f64>,

    /// Generations between progress log lines
    pub log_interval: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: None,
            max_generations: 5000,
            max_evaluations: None,
            tol_fun: 1e-10,
            tol_x: 1e-10,
            sigma_chroma: 20.0,
            sigma_lightness: 10.0,
            seed: None,
            parallel: true,
            max_duration_secs: None,
            log_interval: 100,
        }
    }
}

impl SearchConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load a YAML file, falling back to defaults when it is missing or broken
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                tracing::info!(
                    path = %path.display(),
                    seed = ?config.seed,
                    parallel = config.parallel,
                    "Loaded search configuration"
                );
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = self.population_size {
            if size < 2 {
                return Err(ConfigError::Invalid {
                    field: "population_size",
                    reason: format!("must be at least 2, got {size}"),
                });
            }
        }
        if self.max_generations == 0 {
            return Err(ConfigError::Invalid {
                field: "max_generations",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, value) in [
            ("tol_fun", self.tol_fun),
            ("tol_x", self.tol_x),
            ("sigma_chroma", self.sigma_chroma),
            ("sigma_lightness", self.sigma_lightness),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive and finite, got {value}"),
                });
            }
        }
        self.max_duration()?;
        Ok(())
    }

    /// Wall-clock budget, if any
    pub fn max_duration(&self) -> Result<Option<Duration>, ConfigError> {
        let Some(secs) = self.max_duration_secs else {
            return Ok(None);
        };
        if !(secs.is_finite() && secs > 0.0) {
            return Err(ConfigError::Invalid {
                field: "max_duration_secs",
                reason: format!("must be positive and finite, got {secs}"),
            });
        }
        Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                field: "max_duration_secs",
                reason: format!("{secs} seconds: {e}"),
            })
    }
}
