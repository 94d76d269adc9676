mod logging;
mod run;

use std::path::PathBuf;

use clap::Parser;

use crate::logging::init_logging;
use crate::run::{Mode, execute, load_plan};

#[derive(Parser, Debug)]
#[command(name = "retireplan")]
#[command(about = "Year-by-year retirement projection with tax-aware strategies")]
struct Args {
    /// Path to the plan JSON file
    plan: PathBuf,

    /// Number of years to project
    #[arg(short, long, default_value_t = 30)]
    years: u32,

    /// Run this many Monte Carlo scenarios instead of a single projection
    #[arg(long, value_name = "SCENARIOS")]
    monte_carlo: Option<usize>,

    /// Base seed for Monte Carlo scenarios
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Mean annual market return
    #[arg(long, default_value_t = 0.07)]
    mean: f64,

    /// Standard deviation of annual market returns
    #[arg(long, default_value_t = 0.12)]
    volatility: f64,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn mode(&self) -> Mode {
        match self.monte_carlo {
            Some(scenarios) => Mode::MonteCarlo {
                scenarios,
                years: self.years,
                seed: self.seed,
                mean: self.mean,
                volatility: self.volatility,
            },
            None => Mode::Deterministic { years: self.years },
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level, args.log_file.as_deref())?;

    let plan = load_plan(&args.plan)?;
    let stdout = std::io::stdout();
    execute(&plan, args.mode(), &mut stdout.lock())?;

    tracing::info!("retireplan finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_run_deterministic() {
        let args = Args::try_parse_from(["retireplan", "plan.json"]).unwrap();
        assert_eq!(args.mode(), Mode::Deterministic { years: 30 });
        assert_eq!(args.log_level, "info");
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_monte_carlo_flags() {
        let args = Args::try_parse_from([
            "retireplan",
            "plan.json",
            "--years",
            "40",
            "--monte-carlo",
            "500",
            "--seed",
            "9",
            "--mean",
            "0.05",
            "--volatility",
            "0.15",
        ])
        .unwrap();
        assert_eq!(
            args.mode(),
            Mode::MonteCarlo {
                scenarios: 500,
                years: 40,
                seed: 9,
                mean: 0.05,
                volatility: 0.15,
            }
        );
    }

    #[test]
    fn test_plan_path_is_required() {
        assert!(Args::try_parse_from(["retireplan"]).is_err());
    }
}
