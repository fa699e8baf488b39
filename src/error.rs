use cielab::{Lab, ParseColorError};
use thiserror::Error;

use crate::optimizer::OptimizerError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Search failed: {source}")]
    SearchFailed {
        #[source]
        source: OptimizerError,
        /// Palette decoded from the last mean the optimizer reported as valid
        last_palette: Option<Vec<Lab>>,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid color: {0}")]
    Color(#[from] ParseColorError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
