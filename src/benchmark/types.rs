// src/benchmark/types.rs
use crate::error::FailureReason;
use crate::utils::TokenResourceKey;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output contract of the metric engine: pure, timestamp-free scores so the
/// engine stays bit-deterministic for identical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkScores {
    pub gini: f64,
    pub hhi: f64,
    pub nakamoto: u32,
    pub liquidity: f64,
    pub governance: f64,
    pub ownership: f64,
    pub control_risk: f64,
}

/// Persisted benchmark result for a resource key. Superseded, never mutated;
/// the newest `computed_at` is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSnapshot {
    pub id: Uuid,
    pub resource_key: TokenResourceKey,
    #[serde(flatten)]
    pub scores: BenchmarkScores,
    pub computed_at: DateTime<Utc>,
}

impl BenchmarkSnapshot {
    pub fn new(resource_key: TokenResourceKey, scores: BenchmarkScores) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_key,
            scores,
            computed_at: Utc::now(),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, freshness_window_secs: u64) -> bool {
        now.signed_duration_since(self.computed_at)
            < Duration::seconds(freshness_window_secs as i64)
    }
}

/// Caller-supplied refresh knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Skip the freshness-window cache check and recompute
    pub force: bool,
}

/// Result of one `request_refresh` call.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// A snapshot was produced or served; `from_cache` is true when it came
    /// from the freshness window rather than a fresh computation
    Served {
        snapshot: BenchmarkSnapshot,
        from_cache: bool,
    },
    /// Another refresh already holds the lock; poll the returned job
    Queued { job_id: Uuid },
    /// Terminal failure with a stable reason code; retry is the caller's call
    Failed { reason: FailureReason },
}

impl RefreshOutcome {
    pub fn is_served(&self) -> bool {
        matches!(self, RefreshOutcome::Served { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::TokenResourceKey;

    fn scores() -> BenchmarkScores {
        BenchmarkScores {
            gini: 0.5,
            hhi: 3_000.0,
            nakamoto: 4,
            liquidity: 70.0,
            governance: 60.0,
            ownership: 55.0,
            control_risk: 42.0,
        }
    }

    #[test]
    fn snapshot_freshness_window() {
        let snap = BenchmarkSnapshot::new(TokenResourceKey::holder_benchmark(1, "0xabc"), scores());
        let now = snap.computed_at;
        assert!(snap.is_fresh(now + Duration::seconds(10), 60));
        assert!(!snap.is_fresh(now + Duration::seconds(61), 60));
    }

    #[test]
    fn snapshot_serializes_flat() {
        let snap = BenchmarkSnapshot::new(TokenResourceKey::holder_benchmark(1, "0xabc"), scores());
        let json = serde_json::to_value(&snap).unwrap();
        assert!(json.get("gini").is_some());
        assert!(json.get("control_risk").is_some());
        assert!(json.get("computed_at").is_some());
    }
}
