//! Common test infrastructure for segancha integration tests.
//!
//! Each test file compiles its own copy of this module, so items may appear
//! unused from the perspective of a single test file even though they're
//! used elsewhere.

#![allow(dead_code)]

use std::sync::Once;

use segancha::{ciede2000, Lab, SearchConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Set `RUST_LOG=segancha=debug` to see per-generation output.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "segancha=warn".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer().without_time())
            .try_init();
    });
}

/// Search configuration with a fixed seed.
pub fn seeded_config(seed: u64) -> SearchConfig {
    SearchConfig {
        seed: Some(seed),
        ..Default::default()
    }
}

/// Smallest CIEDE2000 distance between any two colors.
pub fn min_distance(colors: &[Lab]) -> f64 {
    let mut min = f64::INFINITY;
    for (i, &a) in colors.iter().enumerate() {
        for &b in &colors[i + 1..] {
            min = min.min(ciede2000(a, b));
        }
    }
    min
}
