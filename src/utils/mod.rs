// src/utils/mod.rs
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of refreshable computation addressed by a resource key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    HolderBenchmark,
    LiquidityProfile,
    GovernanceProfile,
    MarketStats,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::HolderBenchmark => write!(f, "holder-benchmark"),
            ResourceKind::LiquidityProfile => write!(f, "liquidity-profile"),
            ResourceKind::GovernanceProfile => write!(f, "governance-profile"),
            ResourceKind::MarketStats => write!(f, "market-stats"),
        }
    }
}

/// Composite identity of one refreshable, benchmarked token computation.
/// Immutable once formed; hashing/equality cover all three parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TokenResourceKey {
    pub chain_id: u64,
    pub contract_address: String,
    pub kind: ResourceKind,
}

impl TokenResourceKey {
    pub fn new(chain_id: u64, contract_address: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            chain_id,
            contract_address: contract_address.into(),
            kind,
        }
    }

    /// Default key for the concentration benchmark of a token contract.
    pub fn holder_benchmark(chain_id: u64, contract_address: impl Into<String>) -> Self {
        Self::new(chain_id, contract_address, ResourceKind::HolderBenchmark)
    }
}

impl fmt::Display for TokenResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.chain_id, self.contract_address, self.kind)
    }
}

pub fn setup_logging() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    info!("Logging initialized.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_key_display_is_composite() {
        let key = TokenResourceKey::holder_benchmark(1, "0xdeadbeef");
        assert_eq!(key.to_string(), "1:0xdeadbeef:holder-benchmark");
    }

    #[test]
    fn resource_keys_differ_by_kind() {
        let a = TokenResourceKey::new(1, "0xabc", ResourceKind::HolderBenchmark);
        let b = TokenResourceKey::new(1, "0xabc", ResourceKind::LiquidityProfile);
        assert_ne!(a, b);
    }
}
