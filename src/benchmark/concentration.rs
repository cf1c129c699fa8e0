// src/benchmark/concentration.rs
//! Pure concentration metrics over a holder balance distribution.
//! No I/O and no shared state; identical inputs always produce identical
//! outputs, which is what makes golden-value testing possible.

use crate::error::{BenchError, Result};
use itertools::Itertools;
use std::cmp::Ordering;

/// Rejects distributions the metric functions are not defined for.
/// Negative, NaN and infinite balances are input errors, never silently clamped.
pub fn validate_balances(balances: &[f64]) -> Result<()> {
    if balances.is_empty() {
        return Err(BenchError::InvalidInput(
            "holder balance distribution is empty".to_string(),
        ));
    }
    for (i, balance) in balances.iter().enumerate() {
        if !balance.is_finite() {
            return Err(BenchError::InvalidInput(format!(
                "holder balance at index {} is not finite: {}",
                i, balance
            )));
        }
        if *balance < 0.0 {
            return Err(BenchError::InvalidInput(format!(
                "holder balance at index {} is negative: {}",
                i, balance
            )));
        }
    }
    Ok(())
}

/// Gini coefficient of the distribution, 0 = perfectly equal, 1 = maximally
/// unequal. All-equal distributions (including single-holder and all-zero)
/// yield 0.
pub fn gini(balances: &[f64]) -> Result<f64> {
    validate_balances(balances)?;

    let n = balances.len() as f64;
    let total: f64 = balances.iter().sum();
    if total == 0.0 {
        return Ok(0.0);
    }

    // Rank-weighted form over the ascending-sorted distribution:
    // G = 2 * sum(i * x_i) / (n * sum(x)) - (n + 1) / n
    let weighted: f64 = balances
        .iter()
        .copied()
        .sorted_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .enumerate()
        .map(|(i, x)| (i as f64 + 1.0) * x)
        .sum();

    let g = (2.0 * weighted) / (n * total) - (n + 1.0) / n;
    Ok(g.clamp(0.0, 1.0))
}

/// Herfindahl-Hirschman Index: sum of squared market-share fractions scaled to
/// the conventional 0-10000 range. A zero total held supply yields 0 by
/// convention (no concentration data).
pub fn hhi(balances: &[f64]) -> f64 {
    let total: f64 = balances.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = balances
        .iter()
        .map(|b| {
            let share = b / total;
            share * share
        })
        .sum();
    (sum_sq * 10_000.0).clamp(0.0, 10_000.0)
}

/// Nakamoto coefficient: the smallest count of top holders whose cumulative
/// share strictly exceeds 50% of the total distributed balance.
///
/// Degenerate cases are explicit: a zero total distributed balance returns 0
/// (sentinel: no holder controls anything), and if floating-point rounding
/// keeps the cumulative sum from strictly exceeding half, the holder count
/// itself is returned.
pub fn nakamoto(balances: &[f64]) -> u32 {
    if balances.is_empty() {
        return 0;
    }
    let total: f64 = balances.iter().sum();
    if total <= 0.0 {
        return 0;
    }

    let half = total / 2.0;
    let mut cumulative = 0.0;
    for (idx, balance) in balances
        .iter()
        .copied()
        .sorted_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal))
        .enumerate()
    {
        cumulative += balance;
        if cumulative > half {
            return (idx + 1) as u32;
        }
    }
    balances.len() as u32
}
