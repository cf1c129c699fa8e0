use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// One normalization band: raw values at or above `min` earn `score`.
/// Tables are evaluated first-match over descending `min` values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreTier {
    pub min: f64,
    pub score: f64,
}

impl ScoreTier {
    pub fn new(min: f64, score: f64) -> Self {
        Self { min, score }
    }
}

/// Externally supplied normalization tables for the metric engine. Nothing in
/// the engine invents a threshold at call time; these tables are the single
/// source of truth and can be replaced wholesale from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreThresholds {
    /// Liquidity depth in USD -> base liquidity score (0-100)
    pub liquidity_depth_tiers: Vec<ScoreTier>,
    /// Share of the liquidity score driven by the locked fraction (0-1)
    pub liquidity_lock_blend: f64,
    /// Governance quorum fraction treated as fully healthy
    pub quorum_target: f64,
    /// Multisig signer count -> governance sub-part score (0-100)
    pub signer_tiers: Vec<ScoreTier>,
    /// Timelock duration in hours -> governance sub-part score (0-100)
    pub timelock_tiers: Vec<ScoreTier>,
    /// Distributed share (1 - top holder share) -> ownership score (0-100)
    pub ownership_tiers: Vec<ScoreTier>,
}

static DEFAULT_THRESHOLDS: Lazy<ScoreThresholds> = Lazy::new(|| ScoreThresholds {
    liquidity_depth_tiers: vec![
        ScoreTier::new(1_000_000.0, 100.0),
        ScoreTier::new(250_000.0, 80.0),
        ScoreTier::new(50_000.0, 60.0),
        ScoreTier::new(10_000.0, 40.0),
        ScoreTier::new(1_000.0, 20.0),
        ScoreTier::new(0.0, 0.0),
    ],
    liquidity_lock_blend: 0.4,
    quorum_target: 0.2,
    signer_tiers: vec![
        ScoreTier::new(7.0, 100.0),
        ScoreTier::new(5.0, 80.0),
        ScoreTier::new(3.0, 60.0),
        ScoreTier::new(2.0, 30.0),
        ScoreTier::new(0.0, 0.0),
    ],
    timelock_tiers: vec![
        ScoreTier::new(168.0, 100.0),
        ScoreTier::new(48.0, 80.0),
        ScoreTier::new(24.0, 60.0),
        ScoreTier::new(6.0, 30.0),
        ScoreTier::new(0.0, 0.0),
    ],
    ownership_tiers: vec![
        ScoreTier::new(0.95, 100.0),
        ScoreTier::new(0.85, 80.0),
        ScoreTier::new(0.70, 60.0),
        ScoreTier::new(0.50, 40.0),
        ScoreTier::new(0.25, 20.0),
        ScoreTier::new(0.0, 0.0),
    ],
});

impl Default for ScoreThresholds {
    fn default() -> Self {
        DEFAULT_THRESHOLDS.clone()
    }
}

/// Fixed weights of the composite control-risk score. Must sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreWeights {
    pub gini: f64,
    pub hhi: f64,
    pub nakamoto: f64,
    pub liquidity: f64,
    pub governance: f64,
    pub ownership: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            gini: 0.20,
            hhi: 0.20,
            nakamoto: 0.15,
            liquidity: 0.20,
            governance: 0.15,
            ownership: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.gini + self.hhi + self.nakamoto + self.liquidity + self.governance + self.ownership
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-9
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// How long a successful snapshot is served from cache
    pub freshness_window_secs: u64,
    /// TTL after which a crashed holder's refresh lock becomes reclaimable
    pub lock_ttl_secs: u64,
    /// Max admitted refresh requests per key per window
    pub rate_limit_ceiling: u32,
    pub rate_limit_window_secs: u64,
    pub cycle_interval_seconds: u64,
    pub metrics_log_path: Option<String>,
    pub token_fixtures_path: String,
    pub thresholds: ScoreThresholds,
    pub weights: ScoreWeights,
}

impl Config {
    pub fn from_env() -> Self {
        let thresholds = match env::var("SCORE_THRESHOLDS_PATH").ok() {
            Some(path) => match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
            {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to load thresholds from {}: {}. Using defaults.", path, e);
                    ScoreThresholds::default()
                }
            },
            None => ScoreThresholds::default(),
        };

        let mut weights = ScoreWeights::default();
        if let Ok(raw) = env::var("CONTROL_RISK_WEIGHTS") {
            for part in raw.split(',') {
                let mut kv = part.split(':');
                let (key, value) = match (kv.next(), kv.next().and_then(|v| v.trim().parse::<f64>().ok())) {
                    (Some(k), Some(v)) => (k.trim(), v),
                    _ => continue,
                };
                match key {
                    "gini" => weights.gini = value,
                    "hhi" => weights.hhi = value,
                    "nakamoto" => weights.nakamoto = value,
                    "liquidity" => weights.liquidity = value,
                    "governance" => weights.governance = value,
                    "ownership" => weights.ownership = value,
                    other => warn!("Unknown control-risk weight key: {}", other),
                }
            }
        }

        Config {
            freshness_window_secs: env::var("FRESHNESS_WINDOW_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            lock_ttl_secs: env::var("LOCK_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            rate_limit_ceiling: env::var("RATE_LIMIT_CEILING")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            cycle_interval_seconds: env::var("CYCLE_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            metrics_log_path: env::var("METRICS_LOG_PATH").ok(),
            token_fixtures_path: env::var("TOKEN_FIXTURES_PATH")
                .unwrap_or_else(|_| "fixtures/tokens.json".to_string()),
            thresholds,
            weights,
        }
    }

    pub fn validate_and_log(&self) {
        log::info!("Application Configuration Loaded: {:?}", self);
        if !self.weights.is_normalized() {
            log::error!(
                "Control-risk weights sum to {:.6}, expected 1.0; composite scores will be skewed.",
                self.weights.sum()
            );
        }
        if self.lock_ttl_secs == 0 {
            log::error!("LOCK_TTL_SECS of 0 makes every lock instantly reclaimable.");
        }
        if self.rate_limit_ceiling == 0 {
            log::error!("RATE_LIMIT_CEILING of 0 denies every refresh request.");
        }
    }
}
