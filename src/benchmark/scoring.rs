// src/benchmark/scoring.rs
//! Normalization of raw liquidity/governance/ownership inputs into 0-100
//! sub-scores, and the weighted composite control-risk score. All thresholds
//! and weights are injected from configuration; nothing here is ad hoc.

use crate::config::{ScoreThresholds, ScoreTier, ScoreWeights};
use crate::providers::{GovernanceInputs, LiquidityInputs};

/// First-match lookup over a descending tier table. Values below the lowest
/// band score 0.
pub fn tier_score(value: f64, tiers: &[ScoreTier]) -> f64 {
    tiers
        .iter()
        .find(|t| value >= t.min)
        .map(|t| t.score)
        .unwrap_or(0.0)
}

/// Liquidity sub-score (0-100, higher is healthier): depth band blended with
/// the locked fraction according to the configured blend weight.
pub fn liquidity_score(inputs: &LiquidityInputs, thresholds: &ScoreThresholds) -> f64 {
    let depth = tier_score(inputs.depth_usd.max(0.0), &thresholds.liquidity_depth_tiers);
    let locked = inputs.locked_fraction.clamp(0.0, 1.0) * 100.0;
    let blend = thresholds.liquidity_lock_blend.clamp(0.0, 1.0);
    depth * (1.0 - blend) + locked * blend
}

/// Governance sub-score (0-100, higher is healthier): mean of quorum health,
/// multisig signer band and timelock band.
pub fn governance_score(inputs: &GovernanceInputs, thresholds: &ScoreThresholds) -> f64 {
    let quorum = if thresholds.quorum_target > 0.0 {
        (inputs.quorum_fraction / thresholds.quorum_target).clamp(0.0, 1.0) * 100.0
    } else {
        0.0
    };
    let signers = tier_score(inputs.multisig_signers as f64, &thresholds.signer_tiers);
    let timelock = tier_score(inputs.timelock_hours.max(0.0), &thresholds.timelock_tiers);
    (quorum + signers + timelock) / 3.0
}

/// Ownership sub-score (0-100, higher is healthier): band of the distributed
/// share, i.e. 1 minus the largest holder's share. A zero total scores 0.
pub fn ownership_score(balances: &[f64], thresholds: &ScoreThresholds) -> f64 {
    let total: f64 = balances.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let top = balances.iter().copied().fold(0.0_f64, f64::max);
    let distributed = (1.0 - top / total).clamp(0.0, 1.0);
    tier_score(distributed, &thresholds.ownership_tiers)
}

/// Weighted composite risk (0-100, higher is riskier). Each component is
/// risk-oriented before weighting, so the composite is monotonic: increasing
/// any concentration input never decreases the result.
///
/// A Nakamoto coefficient of 0 (zero distributed balance sentinel) is treated
/// as maximal centralization risk so the sentinel can never flatter a token.
pub fn control_risk(
    gini: f64,
    hhi: f64,
    nakamoto: u32,
    liquidity: f64,
    governance: f64,
    ownership: f64,
    weights: &ScoreWeights,
) -> f64 {
    let nakamoto_risk = if nakamoto == 0 {
        100.0
    } else {
        (100.0 / nakamoto as f64).min(100.0)
    };

    let risk = weights.gini * (gini * 100.0)
        + weights.hhi * (hhi / 100.0)
        + weights.nakamoto * nakamoto_risk
        + weights.liquidity * (100.0 - liquidity.clamp(0.0, 100.0))
        + weights.governance * (100.0 - governance.clamp(0.0, 100.0))
        + weights.ownership * (100.0 - ownership.clamp(0.0, 100.0));

    risk.clamp(0.0, 100.0)
}
