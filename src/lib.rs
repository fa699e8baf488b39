//! Segancha - distinguishable color palettes
//!
//! Searches for palettes whose colors are as far apart as possible in
//! CIEDE2000 while staying displayable in sRGB and printable in CMY.
//! Some colors can be fixed in advance, the free ones can share a fixed
//! lightness, and their chroma can be capped.
//!
//! ```
//! use segancha::{SearchConfig, Searcher};
//!
//! let result = Searcher::new(3)
//!     .lightness(70.0)
//!     .config(SearchConfig { seed: Some(7), ..Default::default() })
//!     .quiet(true)
//!     .run()
//!     .unwrap();
//!
//! println!("{result}");
//! ```
//!
//! The color math lives in the [`cielab`] crate and is re-exported here.

pub mod combinations;
pub mod config;
pub mod error;
pub mod fitness;
pub mod lexi;
pub mod optimizer;
pub mod search;

pub use cielab;
pub use cielab::{ciede2000, max_chroma, Lab, Lch, Rgb};
pub use combinations::CombinationCache;
pub use config::SearchConfig;
pub use error::{ConfigError, SearchError};
pub use fitness::fitness;
pub use lexi::LexiProduct;
pub use optimizer::TerminationFlags;
pub use search::{search, SearchResult, Searcher};
