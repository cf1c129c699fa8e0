// src/main.rs
use log::info;
use std::sync::Arc;

use token_bench::{
    benchmark::RefreshOrchestrator,
    config,
    error::BenchError,
    history::RefreshHistory,
    ledger::JobLedger,
    locks::RefreshLockManager,
    metrics::Metrics,
    providers::{InMemorySnapshotStore, StaticFileProvider},
    rate_limit::{RateLimitConfig, RateLimiter},
    utils::{setup_logging, TokenResourceKey},
};

#[tokio::main]
async fn main() -> Result<(), BenchError> {
    setup_logging().expect("Failed to initialize logging");
    info!("🚀 Token benchmark refresh service starting...");

    // --- Configuration & Initialization ---
    let app_config = config::load_config()?;

    let metrics = Arc::new(Metrics::new(app_config.metrics_log_path.as_deref()));
    let provider = Arc::new(StaticFileProvider::from_path(
        &app_config.token_fixtures_path,
    )?);
    let keys: Vec<TokenResourceKey> = provider
        .known_tokens()
        .into_iter()
        .map(|(chain_id, contract)| TokenResourceKey::holder_benchmark(chain_id, contract))
        .collect();
    info!("Tracking {} token resource keys", keys.len());

    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        ceiling: app_config.rate_limit_ceiling,
        window: std::time::Duration::from_secs(app_config.rate_limit_window_secs),
    }));

    let orchestrator = Arc::new(RefreshOrchestrator::new(
        app_config.clone(),
        Arc::new(JobLedger::new()),
        RefreshLockManager::new(),
        Arc::new(RefreshHistory::new()),
        limiter,
        provider,
        Arc::new(InMemorySnapshotStore::new()),
        metrics.clone(),
    ));

    // --- Periodic refresh cycle ---
    let cycle_orchestrator = orchestrator.clone();
    let cycle_keys = keys.clone();
    let cycle_interval = app_config.cycle_interval_seconds;
    tokio::spawn(async move {
        let mut cycle_count: u64 = 0;
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cycle_interval));

        loop {
            interval.tick().await;
            cycle_count += 1;

            let served = cycle_orchestrator.run_refresh_cycle(&cycle_keys).await;
            info!(
                "🔄 Refresh cycle #{} complete: {}/{} keys served",
                cycle_count,
                served,
                cycle_keys.len()
            );

            if cycle_count % 10 == 0 {
                cycle_orchestrator.metrics().log_summary();
            }
        }
    });

    info!("✅ Refresh orchestrator running. Press CTRL-C to exit.");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| BenchError::Unknown(format!("Failed to listen for ctrl-c: {}", e)))?;

    info!("🛑 Shutting down gracefully...");
    metrics.log_summary();

    Ok(())
}
