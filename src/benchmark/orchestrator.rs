// src/benchmark/orchestrator.rs
//! The Refresh Orchestrator - central coordinator for benchmark refreshes.
//! Decides per request whether to serve cache, attach to an in-flight job, or
//! run a fresh computation under the per-key refresh lock.

use crate::{
    benchmark::engine::compute_benchmark,
    benchmark::types::{BenchmarkSnapshot, RefreshOptions, RefreshOutcome},
    config::Config,
    error::{FailureReason, Result},
    history::{HistoryOutcome, RefreshHistory},
    ledger::{Job, JobLedger},
    locks::{AcquireOutcome, RefreshLockManager},
    metrics::Metrics,
    providers::{RawDataProvider, SnapshotStore},
    rate_limit::{Admission, RateLimiter},
    utils::TokenResourceKey,
};

use chrono::Utc;
use futures::future::join_all;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub struct RefreshOrchestrator {
    config: Arc<Config>,
    ledger: Arc<JobLedger>,
    locks: RefreshLockManager,
    history: Arc<RefreshHistory>,
    limiter: Arc<RateLimiter>,
    provider: Arc<dyn RawDataProvider>,
    snapshots: Arc<dyn SnapshotStore>,
    metrics: Arc<Metrics>,
}

impl RefreshOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        ledger: Arc<JobLedger>,
        locks: RefreshLockManager,
        history: Arc<RefreshHistory>,
        limiter: Arc<RateLimiter>,
        provider: Arc<dyn RawDataProvider>,
        snapshots: Arc<dyn SnapshotStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            ledger,
            locks,
            history,
            limiter,
            provider,
            snapshots,
            metrics,
        }
    }

    /// One refresh request. Never returns a raw internal error: every failure
    /// is a terminal `Failed` with a stable reason code, and the refresh lock
    /// is back in the table's hands whatever path this takes.
    pub async fn request_refresh(
        &self,
        key: &TokenResourceKey,
        options: RefreshOptions,
    ) -> RefreshOutcome {
        // 1. Admission. Denials never touch the lock.
        if let Admission::Denied { retry_after } = self.limiter.admit(&key.to_string()) {
            self.metrics.log_rate_limit_denial(&key.to_string());
            return RefreshOutcome::Failed {
                reason: FailureReason::RateLimited {
                    retry_after_ms: retry_after.as_millis() as u64,
                },
            };
        }

        // 2. Freshness window. A read failure here only costs a recompute.
        if !options.force {
            match self.snapshots.get_latest(key).await {
                Ok(Some(snapshot))
                    if snapshot.is_fresh(Utc::now(), self.config.freshness_window_secs) =>
                {
                    debug!("Serving cached benchmark for {}", key);
                    self.metrics.log_refresh_served(key, true, 0);
                    return RefreshOutcome::Served {
                        snapshot,
                        from_cache: true,
                    };
                }
                Ok(_) => {}
                Err(e) => warn!("Snapshot read failed for {}: {}. Recomputing.", key, e),
            }
        }

        // 3. Coordination. The ledger record exists before the lock publishes
        // its id, so any `Queued { job_id }` a contender receives is already
        // pollable. A loser backs its record out.
        let job_id = Uuid::new_v4();
        let job = self.ledger.create_job(job_id, key.clone());
        let ttl = chrono::Duration::seconds(self.config.lock_ttl_secs as i64);
        let mut guard = match self.locks.try_acquire(key, job_id, ttl) {
            AcquireOutcome::Busy { holder_job_id, .. } => {
                self.ledger.abandon(job_id);
                self.metrics.log_busy_attach(key);
                return RefreshOutcome::Queued {
                    job_id: holder_job_id,
                };
            }
            AcquireOutcome::Acquired(guard) => guard,
        };

        self.metrics.log_job_created(key, job.attempt);

        let started = Instant::now();
        let outcome = match self.run_refresh(key, job_id).await {
            Ok(snapshot) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                self.history
                    .append(key.clone(), job_id, HistoryOutcome::Success, duration_ms);
                self.metrics.log_refresh_served(key, false, duration_ms);
                info!(
                    "Benchmark refreshed for {} in {}ms (control risk {:.1})",
                    key, duration_ms, snapshot.scores.control_risk
                );
                RefreshOutcome::Served {
                    snapshot,
                    from_cache: false,
                }
            }
            Err(e) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                let reason = FailureReason::from(&e);
                warn!("Refresh failed for {} after {}ms: {}", key, duration_ms, e);
                if let Err(ledger_err) = self.ledger.mark_error(job_id, reason) {
                    error!(
                        "Could not record failure on job {}: {}",
                        job_id, ledger_err
                    );
                }
                self.history.append(
                    key.clone(),
                    job_id,
                    HistoryOutcome::Error(reason),
                    duration_ms,
                );
                self.metrics.log_refresh_failed(key, reason);
                RefreshOutcome::Failed { reason }
            }
        };
        // The guard would release on drop anyway; releasing here keeps the
        // handoff visible at the single exit point.
        guard.release();
        outcome
    }

    /// The locked section: job lifecycle, raw-data fetch, compute, persist.
    /// Input-validation errors from the metric engine propagate untouched.
    async fn run_refresh(
        &self,
        key: &TokenResourceKey,
        job_id: Uuid,
    ) -> Result<BenchmarkSnapshot> {
        self.ledger.mark_running(job_id)?;

        let holders = self
            .provider
            .fetch_holder_balances(key.chain_id, &key.contract_address)
            .await?;
        let liquidity = self
            .provider
            .fetch_liquidity_inputs(key.chain_id, &key.contract_address)
            .await?;
        let governance = self
            .provider
            .fetch_governance_inputs(key.chain_id, &key.contract_address)
            .await?;

        let balances: Vec<f64> = holders.iter().map(|h| h.balance).collect();
        let scores = compute_benchmark(
            &balances,
            &liquidity,
            &governance,
            &self.config.thresholds,
            &self.config.weights,
        )?;

        let snapshot = BenchmarkSnapshot::new(key.clone(), scores);
        self.snapshots.put(snapshot.clone()).await?;
        self.ledger.mark_success(job_id, snapshot.id)?;
        Ok(snapshot)
    }

    /// Read-only passthrough to the snapshot store.
    pub async fn get_latest_benchmark(
        &self,
        key: &TokenResourceKey,
    ) -> Result<Option<BenchmarkSnapshot>> {
        self.snapshots.get_latest(key).await
    }

    /// Read-only passthrough to the job ledger.
    pub fn get_job_status(&self, job_id: Uuid) -> Option<Job> {
        self.ledger.get(job_id)
    }

    /// Drives one refresh pass over a set of keys, fanned out concurrently
    /// since distinct keys never contend; returns how many were served (fresh
    /// or cached). Used by the service cycle loop.
    pub async fn run_refresh_cycle(&self, keys: &[TokenResourceKey]) -> usize {
        let outcomes = join_all(
            keys.iter()
                .map(|key| self.request_refresh(key, RefreshOptions::default())),
        )
        .await;

        let mut served = 0;
        for (key, outcome) in keys.iter().zip(outcomes) {
            match outcome {
                RefreshOutcome::Served { .. } => served += 1,
                RefreshOutcome::Queued { job_id } => {
                    debug!("Refresh for {} already in flight (job {})", key, job_id)
                }
                RefreshOutcome::Failed { reason } => {
                    warn!("Cycle refresh failed for {}: {}", key, reason)
                }
            }
        }
        served
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn history(&self) -> &RefreshHistory {
        &self.history
    }

    pub fn ledger(&self) -> &JobLedger {
        &self.ledger
    }
}
