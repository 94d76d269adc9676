//! Monte Carlo wrapper around the deterministic projection
//!
//! Every scenario is a full projection whose market accounts follow a sampled
//! path of annual returns. Scenarios run in batches of [`BATCH_SIZE`]; batch
//! `b` seeds a `SmallRng` with `seed + b` and hands each of its scenarios the
//! next `u64` from it. Scenario seeds therefore depend only on the base seed,
//! never on how batches are scheduled across threads.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::error::MonteCarloError;
use crate::model::{
    Cents, MarketPath, MonteCarloSummary, PercentileBands, Plan, ReturnAssumption,
    ScenarioOutcome, SequenceRiskReport,
};
use crate::projection::project;
use crate::rules::RuleEngine;

pub const BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub scenarios: usize,
    pub years: u32,
    pub seed: u64,
    pub returns: ReturnAssumption,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            scenarios: 1_000,
            years: 30,
            seed: 0,
            returns: ReturnAssumption::US_BALANCED_60_40,
        }
    }
}

pub fn run_monte_carlo(
    plan: &Plan,
    config: &MonteCarloConfig,
) -> Result<MonteCarloSummary, MonteCarloError> {
    run_monte_carlo_with_cancel(plan, config, &AtomicBool::new(false))
}

/// Run scenarios until done or until `cancel` is set.
///
/// Cancellation is checked between scenarios; a scenario in progress always
/// finishes.
pub fn run_monte_carlo_with_cancel(
    plan: &Plan,
    config: &MonteCarloConfig,
    cancel: &AtomicBool,
) -> Result<MonteCarloSummary, MonteCarloError> {
    let engine = RuleEngine::from_plan(plan)?;
    // Reject bad distribution parameters before spawning any work
    config
        .returns
        .sample(&mut SmallRng::seed_from_u64(config.seed))?;

    let num_batches = config.scenarios.div_ceil(BATCH_SIZE);
    let run_batch = |batch: usize| -> Result<Vec<ScenarioOutcome>, MonteCarloError> {
        let mut rng = SmallRng::seed_from_u64(config.seed.wrapping_add(batch as u64));
        let batch_size = BATCH_SIZE.min(config.scenarios - batch * BATCH_SIZE);
        let mut outcomes = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            if cancel.load(Ordering::Relaxed) {
                return Err(MonteCarloError::Cancelled);
            }
            let seed = rng.next_u64();
            outcomes.push(run_scenario(plan, &engine, config, seed)?);
        }
        Ok(outcomes)
    };

    #[cfg(feature = "parallel")]
    let batches = (0..num_batches)
        .into_par_iter()
        .map(run_batch)
        .collect::<Result<Vec<_>, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let batches = (0..num_batches)
        .map(run_batch)
        .collect::<Result<Vec<_>, _>>()?;

    let outcomes: Vec<ScenarioOutcome> = batches.into_iter().flatten().collect();
    let summary = summarize(outcomes, config.years);

    tracing::info!(
        scenarios = summary.scenarios,
        years = summary.years,
        success_rate = summary.success_rate,
        median_final_balance = %summary.percentiles.p50,
        "monte carlo finished"
    );
    Ok(summary)
}

fn run_scenario(
    plan: &Plan,
    engine: &RuleEngine,
    config: &MonteCarloConfig,
    seed: u64,
) -> Result<ScenarioOutcome, MonteCarloError> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let returns = config.returns.sample_sequence(&mut rng, config.years as usize)?;
    let path = MarketPath::new(returns);
    let outcome = project(plan, engine, config.years, Some(&path));
    Ok(ScenarioOutcome {
        seed,
        final_balance: outcome.final_balance(),
        depleted_at: outcome.depleted_at,
    })
}

/// Nearest-rank percentile of an ascending slice
fn percentile(sorted: &[Cents], q: f64) -> Cents {
    if sorted.is_empty() {
        return Cents::ZERO;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Failures before the horizon midpoint count as early
pub fn sequence_risk(outcomes: &[ScenarioOutcome], years: u32) -> SequenceRiskReport {
    let midpoint = years / 2;
    let offsets: Vec<u32> = outcomes.iter().filter_map(|o| o.depleted_at).collect();
    let early_failures = offsets.iter().filter(|&&offset| offset < midpoint).count();
    let failures = offsets.len();
    SequenceRiskReport {
        early_failures,
        late_failures: failures - early_failures,
        early_failure_share: if failures == 0 {
            0.0
        } else {
            early_failures as f64 / failures as f64
        },
        average_depletion_offset: (failures > 0)
            .then(|| offsets.iter().map(|&o| f64::from(o)).sum::<f64>() / failures as f64),
    }
}

pub fn summarize(outcomes: Vec<ScenarioOutcome>, years: u32) -> MonteCarloSummary {
    let scenarios = outcomes.len();
    let mut balances: Vec<Cents> = outcomes.iter().map(|o| o.final_balance).collect();
    balances.sort_unstable();

    let successes = outcomes.iter().filter(|o| o.depleted_at.is_none()).count();
    let (success_rate, mean_final_balance) = if scenarios == 0 {
        (0.0, Cents::ZERO)
    } else {
        let total: i128 = balances.iter().map(|b| i128::from(b.0)).sum();
        (
            successes as f64 / scenarios as f64,
            Cents((total / scenarios as i128) as i64),
        )
    };

    MonteCarloSummary {
        scenarios,
        years,
        success_rate,
        mean_final_balance,
        percentiles: PercentileBands {
            p10: percentile(&balances, 0.10),
            p25: percentile(&balances, 0.25),
            p50: percentile(&balances, 0.50),
            p75: percentile(&balances, 0.75),
            p90: percentile(&balances, 0.90),
        },
        sequence_risk: sequence_risk(&outcomes, years),
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(final_dollars: i64, depleted_at: Option<u32>) -> ScenarioOutcome {
        ScenarioOutcome {
            seed: 0,
            final_balance: Cents::from_dollars(final_dollars),
            depleted_at,
        }
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let outcomes = (1..=10).map(|i| outcome(i * 100, None)).collect();
        let summary = summarize(outcomes, 30);
        assert_eq!(summary.percentiles.p10, Cents::from_dollars(100));
        assert_eq!(summary.percentiles.p25, Cents::from_dollars(300));
        assert_eq!(summary.percentiles.p50, Cents::from_dollars(500));
        assert_eq!(summary.percentiles.p90, Cents::from_dollars(900));
        assert_eq!(summary.mean_final_balance, Cents::from_dollars(550));
        assert_eq!(summary.success_rate, 1.0);
    }

    #[test]
    fn test_sequence_risk_splits_at_midpoint() {
        let outcomes = vec![
            outcome(0, Some(3)),
            outcome(0, Some(14)),
            outcome(0, Some(15)),
            outcome(0, Some(29)),
            outcome(1_000, None),
        ];
        let report = sequence_risk(&outcomes, 30);
        assert_eq!(report.early_failures, 2);
        assert_eq!(report.late_failures, 2);
        assert_eq!(report.early_failure_share, 0.5);
        assert_eq!(report.average_depletion_offset, Some(15.25));
    }

    #[test]
    fn test_empty_run() {
        let summary = summarize(Vec::new(), 30);
        assert_eq!(summary.scenarios, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.percentiles, PercentileBands::default());
        assert_eq!(summary.sequence_risk.average_depletion_offset, None);
    }
}
