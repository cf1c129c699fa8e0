pub mod settings;

pub use settings::{Config, ScoreThresholds, ScoreTier, ScoreWeights};

use crate::error::{BenchError, Result};
use std::sync::Arc;

/// Loads and returns the application configuration as an `Arc<Config>`.
/// Centralizes dotenv loading and the critical-value checks.
pub fn load_config() -> Result<Arc<Config>> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors

    let config = Config::from_env();

    if !config.weights.is_normalized() {
        return Err(BenchError::ConfigError(format!(
            "control-risk weights must sum to 1.0, got {:.6}",
            config.weights.sum()
        )));
    }
    if config.freshness_window_secs == 0 {
        return Err(BenchError::ConfigError(
            "FRESHNESS_WINDOW_SECS cannot be 0".to_string(),
        ));
    }

    config.validate_and_log();

    Ok(Arc::new(config))
}
