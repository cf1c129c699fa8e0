// src/benchmark/engine.rs
//! The metric engine entry point: validation plus assembly of all
//! concentration and health scores into one `BenchmarkScores` value.

use super::concentration::{gini, hhi, nakamoto, validate_balances};
use super::scoring::{control_risk, governance_score, liquidity_score, ownership_score};
use super::types::BenchmarkScores;
use crate::config::{ScoreThresholds, ScoreWeights};
use crate::error::Result;
use crate::providers::{GovernanceInputs, LiquidityInputs};

/// Computes the full benchmark for one holder distribution plus its raw
/// liquidity and governance facts. Pure: no I/O, no clock, no randomness.
/// Validation errors propagate untouched; they are never caught here.
pub fn compute_benchmark(
    holder_balances: &[f64],
    liquidity: &LiquidityInputs,
    governance: &GovernanceInputs,
    thresholds: &ScoreThresholds,
    weights: &ScoreWeights,
) -> Result<BenchmarkScores> {
    validate_balances(holder_balances)?;

    let gini = gini(holder_balances)?;
    let hhi = hhi(holder_balances);
    let nakamoto = nakamoto(holder_balances);

    let liquidity = liquidity_score(liquidity, thresholds);
    let governance = governance_score(governance, thresholds);
    let ownership = ownership_score(holder_balances, thresholds);

    let control_risk = control_risk(
        gini, hhi, nakamoto, liquidity, governance, ownership, weights,
    );

    Ok(BenchmarkScores {
        gini,
        hhi,
        nakamoto,
        liquidity,
        governance,
        ownership,
        control_risk,
    })
}
