// src/providers/mod.rs
//! Seams to the external collaborators the core consumes: the raw-data
//! provider that delivers holder/liquidity/governance inputs, and the snapshot
//! store that persists computed benchmarks.

pub mod static_file;

pub use static_file::StaticFileProvider;

use crate::benchmark::types::BenchmarkSnapshot;
use crate::error::Result;
use crate::utils::TokenResourceKey;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// One holder's balance as reported by the upstream indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderBalance {
    pub holder_id: String,
    pub balance: f64,
}

/// Raw liquidity facts for a token contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LiquidityInputs {
    /// Aggregate pool depth in USD across venues
    pub depth_usd: f64,
    /// Fraction of liquidity provably locked or burned (0-1)
    pub locked_fraction: f64,
}

/// Raw governance facts for a token contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GovernanceInputs {
    /// Participation quorum as a fraction of circulating supply (0-1)
    pub quorum_fraction: f64,
    /// Signers on the controlling multisig; 0 or 1 means a single key rules
    pub multisig_signers: u32,
    /// Timelock delay on privileged operations, in hours
    pub timelock_hours: f64,
}

/// Upstream raw-data collaborator. Failures surface as
/// `BenchError::UpstreamUnavailable` or `BenchError::ProviderRateLimited`.
#[async_trait]
pub trait RawDataProvider: Send + Sync {
    async fn fetch_holder_balances(
        &self,
        chain_id: u64,
        contract_address: &str,
    ) -> Result<Vec<HolderBalance>>;

    async fn fetch_liquidity_inputs(
        &self,
        chain_id: u64,
        contract_address: &str,
    ) -> Result<LiquidityInputs>;

    async fn fetch_governance_inputs(
        &self,
        chain_id: u64,
        contract_address: &str,
    ) -> Result<GovernanceInputs>;
}

/// Persistence seam for computed benchmarks. Later snapshots supersede earlier
/// ones; nothing is mutated in place.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn put(&self, snapshot: BenchmarkSnapshot) -> Result<()>;
    async fn get_latest(&self, key: &TokenResourceKey) -> Result<Option<BenchmarkSnapshot>>;
}

/// In-process snapshot store backed by a DashMap. Keeps the full supersession
/// chain per key; the newest `computed_at` wins reads.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    inner: DashMap<TokenResourceKey, Vec<BenchmarkSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_count(&self, key: &TokenResourceKey) -> usize {
        self.inner.get(key).map(|v| v.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put(&self, snapshot: BenchmarkSnapshot) -> Result<()> {
        self.inner
            .entry(snapshot.resource_key.clone())
            .or_default()
            .push(snapshot);
        Ok(())
    }

    async fn get_latest(&self, key: &TokenResourceKey) -> Result<Option<BenchmarkSnapshot>> {
        Ok(self.inner.get(key).and_then(|chain| {
            chain
                .iter()
                .max_by_key(|s| s.computed_at)
                .cloned()
        }))
    }
}
