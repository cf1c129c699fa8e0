// src/metrics/mod.rs
//! Operational counters for the refresh core plus an optional JSON-lines
//! event log for offline analysis of refresh behavior.

use crate::error::FailureReason;
use crate::utils::TokenResourceKey;
use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct Metrics {
    refreshes_served: AtomicU64,
    cache_hits: AtomicU64,
    refreshes_failed: AtomicU64,
    rate_limit_denials: AtomicU64,
    busy_attaches: AtomicU64,
    jobs_created: AtomicU64,
    log_file: Mutex<Option<std::fs::File>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSummary {
    pub refreshes_served: u64,
    pub cache_hits: u64,
    pub refreshes_failed: u64,
    pub rate_limit_denials: u64,
    pub busy_attaches: u64,
    pub jobs_created: u64,
}

impl Metrics {
    pub fn new(log_path: Option<&str>) -> Self {
        let log_file = log_path.and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!("Failed to open metrics log file {}: {}", path, e);
                    None
                }
            }
        });
        Self {
            log_file: Mutex::new(log_file),
            ..Self::default()
        }
    }

    pub fn log_job_created(&self, key: &TokenResourceKey, attempt: u32) {
        self.jobs_created.fetch_add(1, Ordering::Relaxed);
        self.write_event(json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "job_created",
            "resource_key": key.to_string(),
            "attempt": attempt,
        }));
    }

    pub fn log_refresh_served(&self, key: &TokenResourceKey, from_cache: bool, duration_ms: u64) {
        self.refreshes_served.fetch_add(1, Ordering::Relaxed);
        if from_cache {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        self.write_event(json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "refresh_served",
            "resource_key": key.to_string(),
            "from_cache": from_cache,
            "duration_ms": duration_ms,
        }));
    }

    pub fn log_refresh_failed(&self, key: &TokenResourceKey, reason: FailureReason) {
        self.refreshes_failed.fetch_add(1, Ordering::Relaxed);
        self.write_event(json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "refresh_failed",
            "resource_key": key.to_string(),
            "reason": reason.code(),
        }));
    }

    pub fn log_rate_limit_denial(&self, key: &str) {
        self.rate_limit_denials.fetch_add(1, Ordering::Relaxed);
        self.write_event(json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "rate_limit_denied",
            "key": key,
        }));
    }

    pub fn log_busy_attach(&self, key: &TokenResourceKey) {
        self.busy_attaches.fetch_add(1, Ordering::Relaxed);
        self.write_event(json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "attached_to_inflight",
            "resource_key": key.to_string(),
        }));
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            refreshes_served: self.refreshes_served.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
            rate_limit_denials: self.rate_limit_denials.load(Ordering::Relaxed),
            busy_attaches: self.busy_attaches.load(Ordering::Relaxed),
            jobs_created: self.jobs_created.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let s = self.summary();
        info!(
            "Refresh metrics: served={} (cache hits {}), failed={}, rate-limited={}, busy-attached={}, jobs={}",
            s.refreshes_served,
            s.cache_hits,
            s.refreshes_failed,
            s.rate_limit_denials,
            s.busy_attaches,
            s.jobs_created
        );
    }

    fn write_event(&self, event: serde_json::Value) {
        let mut guard = match self.log_file.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(file) = guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", event) {
                warn!("Failed to write metrics event: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new(None);
        let key = TokenResourceKey::holder_benchmark(1, "0xabc");

        metrics.log_job_created(&key, 1);
        metrics.log_refresh_served(&key, false, 25);
        metrics.log_refresh_served(&key, true, 0);
        metrics.log_refresh_failed(&key, FailureReason::UpstreamUnavailable);
        metrics.log_rate_limit_denial("caller-1");
        metrics.log_busy_attach(&key);

        let s = metrics.summary();
        assert_eq!(s.jobs_created, 1);
        assert_eq!(s.refreshes_served, 2);
        assert_eq!(s.cache_hits, 1);
        assert_eq!(s.refreshes_failed, 1);
        assert_eq!(s.rate_limit_denials, 1);
        assert_eq!(s.busy_attaches, 1);
    }
}
