use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Barrier;

use token_bench::benchmark::{RefreshOptions, RefreshOrchestrator, RefreshOutcome};
use token_bench::config::{Config, ScoreThresholds, ScoreWeights};
use token_bench::error::Result;
use token_bench::history::RefreshHistory;
use token_bench::ledger::JobLedger;
use token_bench::locks::RefreshLockManager;
use token_bench::metrics::Metrics;
use token_bench::providers::{
    GovernanceInputs, HolderBalance, InMemorySnapshotStore, LiquidityInputs, RawDataProvider,
};
use token_bench::rate_limit::{RateLimitConfig, RateLimiter};
use token_bench::utils::TokenResourceKey;

/// Provider that holds every holder fetch open for a fixed delay, long enough
/// for competing requests to hit the lock while a computation is in flight.
struct SlowProvider {
    delay: Duration,
    holder_fetches: AtomicU64,
}

impl SlowProvider {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            holder_fetches: AtomicU64::new(0),
        }
    }

    fn holder_fetches(&self) -> u64 {
        self.holder_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RawDataProvider for SlowProvider {
    async fn fetch_holder_balances(
        &self,
        _chain_id: u64,
        _contract_address: &str,
    ) -> Result<Vec<HolderBalance>> {
        self.holder_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec![
            HolderBalance {
                holder_id: "h1".to_string(),
                balance: 700.0,
            },
            HolderBalance {
                holder_id: "h2".to_string(),
                balance: 200.0,
            },
            HolderBalance {
                holder_id: "h3".to_string(),
                balance: 100.0,
            },
        ])
    }

    async fn fetch_liquidity_inputs(
        &self,
        _chain_id: u64,
        _contract_address: &str,
    ) -> Result<LiquidityInputs> {
        Ok(LiquidityInputs {
            depth_usd: 500_000.0,
            locked_fraction: 0.7,
        })
    }

    async fn fetch_governance_inputs(
        &self,
        _chain_id: u64,
        _contract_address: &str,
    ) -> Result<GovernanceInputs> {
        Ok(GovernanceInputs {
            quorum_fraction: 0.2,
            multisig_signers: 6,
            timelock_hours: 72.0,
        })
    }
}

fn orchestrator_with(
    provider: Arc<SlowProvider>,
    snapshots: Arc<InMemorySnapshotStore>,
) -> Arc<RefreshOrchestrator> {
    let config = Arc::new(Config {
        freshness_window_secs: 300,
        lock_ttl_secs: 30,
        rate_limit_ceiling: 1_000,
        rate_limit_window_secs: 60,
        cycle_interval_seconds: 30,
        metrics_log_path: None,
        token_fixtures_path: "fixtures/tokens.json".to_string(),
        thresholds: ScoreThresholds::default(),
        weights: ScoreWeights::default(),
    });
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        ceiling: config.rate_limit_ceiling,
        window: std::time::Duration::from_secs(config.rate_limit_window_secs),
    }));
    Arc::new(RefreshOrchestrator::new(
        config,
        Arc::new(JobLedger::new()),
        RefreshLockManager::new(),
        Arc::new(RefreshHistory::new()),
        limiter,
        provider,
        snapshots,
        Arc::new(Metrics::new(None)),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stampede_collapses_to_one_computation() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(300)));
    let snapshots = Arc::new(InMemorySnapshotStore::new());
    let orchestrator = orchestrator_with(provider.clone(), snapshots.clone());
    let key = TokenResourceKey::holder_benchmark(1, "0xhot");

    let contenders = 8;
    let barrier = Arc::new(Barrier::new(contenders));
    let mut handles = Vec::with_capacity(contenders);
    for _ in 0..contenders {
        let orchestrator = orchestrator.clone();
        let barrier = barrier.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            orchestrator
                .request_refresh(&key, RefreshOptions::default())
                .await
        }));
    }

    let mut fresh_computes = 0;
    let mut queued = 0;
    let mut cache_hits = 0;
    for handle in handles {
        match handle.await.unwrap() {
            RefreshOutcome::Served { from_cache: false, .. } => fresh_computes += 1,
            RefreshOutcome::Served { from_cache: true, .. } => cache_hits += 1,
            RefreshOutcome::Queued { .. } => queued += 1,
            RefreshOutcome::Failed { reason } => panic!("unexpected failure: {}", reason),
        }
    }

    assert_eq!(fresh_computes, 1, "exactly one contender may compute");
    assert_eq!(fresh_computes + queued + cache_hits, contenders);
    assert_eq!(provider.holder_fetches(), 1);
    assert_eq!(snapshots.snapshot_count(&key), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queued_contenders_name_the_in_flight_job() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(300)));
    let snapshots = Arc::new(InMemorySnapshotStore::new());
    let orchestrator = orchestrator_with(provider.clone(), snapshots);
    let key = TokenResourceKey::holder_benchmark(1, "0xpoll");

    let runner = {
        let orchestrator = orchestrator.clone();
        let key = key.clone();
        tokio::spawn(async move {
            orchestrator
                .request_refresh(&key, RefreshOptions::default())
                .await
        })
    };

    // Give the runner time to take the lock, then contend
    tokio::time::sleep(Duration::from_millis(100)).await;
    let contender = orchestrator
        .request_refresh(&key, RefreshOptions::default())
        .await;
    let queued_job_id = match contender {
        RefreshOutcome::Queued { job_id } => job_id,
        other => panic!("expected Queued while refresh in flight, got {:?}", other),
    };

    // An advertised job id resolves immediately, not only after completion
    let in_flight = orchestrator
        .get_job_status(queued_job_id)
        .expect("queued job id must be pollable while the refresh runs");
    assert_eq!(in_flight.resource_key, key);
    assert!(!in_flight.status.is_terminal());

    assert!(runner.await.unwrap().is_served());
    // The named job is the one that ran and finished
    let job = orchestrator.get_job_status(queued_job_id).unwrap();
    assert_eq!(job.resource_key, key);
    assert!(job.status.is_terminal());
    // The contender's own abandoned record left no trace
    assert_eq!(orchestrator.ledger().get_latest(&key).unwrap().id, queued_job_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_cycle_fans_out_across_keys() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(200)));
    let snapshots = Arc::new(InMemorySnapshotStore::new());
    let orchestrator = orchestrator_with(provider.clone(), snapshots);
    let keys = vec![
        TokenResourceKey::holder_benchmark(1, "0x111"),
        TokenResourceKey::holder_benchmark(1, "0x222"),
        TokenResourceKey::holder_benchmark(1, "0x333"),
    ];

    let started = std::time::Instant::now();
    let served = orchestrator.run_refresh_cycle(&keys).await;

    assert_eq!(served, 3);
    assert_eq!(provider.holder_fetches(), 3);
    // Three serialized 200ms computes would take 600ms+
    assert!(started.elapsed() < Duration::from_millis(550));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_keys_refresh_in_parallel() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(200)));
    let snapshots = Arc::new(InMemorySnapshotStore::new());
    let orchestrator = orchestrator_with(provider.clone(), snapshots);

    let key_a = TokenResourceKey::holder_benchmark(1, "0xaaa");
    let key_b = TokenResourceKey::holder_benchmark(1, "0xbbb");

    let started = std::time::Instant::now();
    let (a, b) = tokio::join!(
        orchestrator.request_refresh(&key_a, RefreshOptions::default()),
        orchestrator.request_refresh(&key_b, RefreshOptions::default()),
    );

    assert!(matches!(a, RefreshOutcome::Served { from_cache: false, .. }));
    assert!(matches!(b, RefreshOutcome::Served { from_cache: false, .. }));
    assert_eq!(provider.holder_fetches(), 2);
    // Two serialized 200ms computes would take 400ms+
    assert!(started.elapsed() < Duration::from_millis(390));
}
