// src/providers/static_file.rs
//! JSON-fixture-backed `RawDataProvider` so the service binary and integration
//! tests run without live upstream collaborators.

use super::{GovernanceInputs, HolderBalance, LiquidityInputs, RawDataProvider};
use crate::error::{BenchError, Result};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenFixture {
    pub chain_id: u64,
    pub contract_address: String,
    pub holders: Vec<HolderBalance>,
    pub liquidity: LiquidityInputs,
    pub governance: GovernanceInputs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FixtureFile {
    tokens: Vec<TokenFixture>,
}

pub struct StaticFileProvider {
    tokens: HashMap<(u64, String), TokenFixture>,
}

impl StaticFileProvider {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            BenchError::ConfigError(format!(
                "failed to read token fixtures from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let parsed: FixtureFile = serde_json::from_str(&raw)?;
        info!(
            "Loaded {} token fixtures from {}",
            parsed.tokens.len(),
            path.as_ref().display()
        );
        Ok(Self::from_fixtures(parsed.tokens))
    }

    pub fn from_fixtures(fixtures: Vec<TokenFixture>) -> Self {
        let tokens = fixtures
            .into_iter()
            .map(|t| ((t.chain_id, t.contract_address.clone()), t))
            .collect();
        Self { tokens }
    }

    /// All (chain_id, contract_address) pairs this provider can serve.
    pub fn known_tokens(&self) -> Vec<(u64, String)> {
        self.tokens.keys().cloned().collect()
    }

    fn lookup(&self, chain_id: u64, contract_address: &str) -> Result<&TokenFixture> {
        self.tokens
            .get(&(chain_id, contract_address.to_string()))
            .ok_or_else(|| {
                BenchError::UpstreamUnavailable(format!(
                    "no fixture for chain {} contract {}",
                    chain_id, contract_address
                ))
            })
    }
}

#[async_trait]
impl RawDataProvider for StaticFileProvider {
    async fn fetch_holder_balances(
        &self,
        chain_id: u64,
        contract_address: &str,
    ) -> Result<Vec<HolderBalance>> {
        Ok(self.lookup(chain_id, contract_address)?.holders.clone())
    }

    async fn fetch_liquidity_inputs(
        &self,
        chain_id: u64,
        contract_address: &str,
    ) -> Result<LiquidityInputs> {
        Ok(self.lookup(chain_id, contract_address)?.liquidity)
    }

    async fn fetch_governance_inputs(
        &self,
        chain_id: u64,
        contract_address: &str,
    ) -> Result<GovernanceInputs> {
        Ok(self.lookup(chain_id, contract_address)?.governance)
    }
}
