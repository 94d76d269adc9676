//! Plan loading and the two run modes

use std::io::Write;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use retireplan_core::model::{Plan, ReturnAssumption};
use retireplan_core::{MonteCarloConfig, run_monte_carlo, run_projection};

/// What to run against the loaded plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Deterministic {
        years: u32,
    },
    MonteCarlo {
        scenarios: usize,
        years: u32,
        seed: u64,
        mean: f64,
        volatility: f64,
    },
}

/// Read a JSON plan. The plan is trusted as-is.
pub fn load_plan(path: &Path) -> color_eyre::Result<Plan> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read plan file {}", path.display()))?;
    let plan: Plan = serde_json::from_str(&text)
        .wrap_err_with(|| format!("failed to parse plan file {}", path.display()))?;
    tracing::debug!(
        accounts = plan.accounts.len(),
        incomes = plan.incomes.len(),
        expenses = plan.expenses.len(),
        "loaded plan"
    );
    Ok(plan)
}

/// Run `mode` and write pretty JSON results to `out`
pub fn execute(plan: &Plan, mode: Mode, out: &mut impl Write) -> color_eyre::Result<()> {
    match mode {
        Mode::Deterministic { years } => {
            let outcome = run_projection(plan, years)?;
            tracing::info!(
                years = outcome.years.len(),
                depleted_at = ?outcome.depleted_at,
                "projection complete"
            );
            serde_json::to_writer_pretty(&mut *out, &outcome)?;
        }
        Mode::MonteCarlo {
            scenarios,
            years,
            seed,
            mean,
            volatility,
        } => {
            let config = MonteCarloConfig {
                scenarios,
                years,
                seed,
                returns: ReturnAssumption::Normal {
                    mean,
                    std_dev: volatility,
                },
            };
            let summary = run_monte_carlo(plan, &config)?;
            tracing::info!(
                scenarios = summary.scenarios,
                success_rate = summary.success_rate,
                "monte carlo complete"
            );
            serde_json::to_writer_pretty(&mut *out, &summary)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retireplan_core::model::{MonteCarloSummary, ProjectionOutcome};
    use retireplan_core::{AccountBuilder, PlanBuilder};

    fn sample_plan() -> Plan {
        PlanBuilder::new()
            .ages(60, 62)
            .start_year(2025)
            .account(AccountBuilder::traditional_ira("IRA").balance(600_000))
            .account(AccountBuilder::roth_ira("Roth").balance(100_000))
            .retirement_spending(40_000)
            .social_security(67, 24_000)
            .build()
    }

    fn write_plan(plan: &Plan) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(plan).unwrap().as_bytes())
            .unwrap();
        file
    }

    #[test]
    fn test_load_plan_roundtrips_json() {
        let plan = sample_plan();
        let file = write_plan(&plan);
        let loaded = load_plan(file.path()).unwrap();
        assert_eq!(loaded.accounts, plan.accounts);
        assert_eq!(loaded.retirement_spending, plan.retirement_spending);
        assert_eq!(loaded.social_security.start_age, 67);
    }

    #[test]
    fn test_load_plan_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_plan(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read plan file"));
    }

    #[test]
    fn test_load_plan_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = load_plan(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse plan file"));
    }

    #[test]
    fn test_deterministic_output_is_projection_json() {
        let plan = sample_plan();
        let mut out = Vec::new();
        execute(&plan, Mode::Deterministic { years: 10 }, &mut out).unwrap();

        let outcome: ProjectionOutcome = serde_json::from_slice(&out).unwrap();
        assert_eq!(outcome.years.len(), 10);
        assert_eq!(outcome.depleted_at, None);

        let mut expected = serde_json::to_vec_pretty(&run_projection(&plan, 10).unwrap()).unwrap();
        expected.push(b'\n');
        assert_eq!(out, expected);
    }

    #[test]
    fn test_monte_carlo_output_is_summary_json() {
        let plan = sample_plan();
        let mode = Mode::MonteCarlo {
            scenarios: 50,
            years: 20,
            seed: 7,
            mean: 0.06,
            volatility: 0.1,
        };
        let mut first = Vec::new();
        let mut second = Vec::new();
        execute(&plan, mode, &mut first).unwrap();
        execute(&plan, mode, &mut second).unwrap();

        let summary: MonteCarloSummary = serde_json::from_slice(&first).unwrap();
        assert_eq!(summary.scenarios, 50);
        assert_eq!(summary.years, 20);
        assert_eq!(first, second);
    }

    #[test]
    fn test_negative_volatility_is_an_error() {
        let mode = Mode::MonteCarlo {
            scenarios: 10,
            years: 5,
            seed: 0,
            mean: 0.07,
            volatility: -1.0,
        };
        assert!(execute(&sample_plan(), mode, &mut Vec::new()).is_err());
    }
}
