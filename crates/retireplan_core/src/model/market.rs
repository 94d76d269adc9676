//! Market return assumptions
//!
//! The deterministic projection grows every account at a fixed rate. Monte Carlo
//! runs replace that rate with a sampled path of annual returns, drawn up front
//! so a scenario is fully determined by its seed.

use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

use crate::error::MonteCarloError;

/// Distribution of annual portfolio returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReturnAssumption {
    Fixed(f64),
    /// Normal approximation with arithmetic mean and volatility
    Normal { mean: f64, std_dev: f64 },
    /// Lognormal gross return matched to the same arithmetic mean and volatility
    LogNormal { mean: f64, std_dev: f64 },
}

impl ReturnAssumption {
    pub const US_BALANCED_60_40: ReturnAssumption = ReturnAssumption::Normal {
        mean: 0.07,
        std_dev: 0.12,
    };

    /// Sample a single annual return
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, MonteCarloError> {
        match *self {
            ReturnAssumption::Fixed(rate) => Ok(rate),
            ReturnAssumption::Normal { mean, std_dev } => rand_distr::Normal::new(mean, std_dev)
                .map(|d| d.sample(rng))
                .map_err(|_| MonteCarloError::InvalidDistribution {
                    distribution: "Normal return",
                    mean,
                    std_dev,
                }),
            ReturnAssumption::LogNormal { mean, std_dev } => {
                let gross = 1.0 + mean;
                if gross <= 0.0 {
                    return Err(MonteCarloError::InvalidDistribution {
                        distribution: "LogNormal return",
                        mean,
                        std_dev,
                    });
                }
                let sigma_sq = (1.0 + (std_dev * std_dev) / (gross * gross)).ln();
                let mu = gross.ln() - sigma_sq / 2.0;
                rand_distr::LogNormal::new(mu, sigma_sq.sqrt())
                    .map(|d| d.sample(rng) - 1.0)
                    .map_err(|_| MonteCarloError::InvalidDistribution {
                        distribution: "LogNormal return",
                        mean,
                        std_dev,
                    })
            }
        }
    }

    /// Sample `num_years` independent annual returns
    pub fn sample_sequence<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        num_years: usize,
    ) -> Result<Vec<f64>, MonteCarloError> {
        (0..num_years).map(|_| self.sample(rng)).collect()
    }
}

/// Per-year return overrides for one projection run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketPath {
    /// Return for each year offset; accounts with their own rate ignore it
    pub returns: Vec<f64>,
}

impl MarketPath {
    #[must_use]
    pub fn new(returns: Vec<f64>) -> Self {
        Self { returns }
    }

    /// Return for a year offset, `None` past the end of the path
    #[must_use]
    pub fn return_for(&self, year_offset: u32) -> Option<f64> {
        self.returns.get(year_offset as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn moments(samples: &[f64]) -> (f64, f64) {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var.sqrt())
    }

    #[test]
    fn test_normal_reproduces_mean_and_volatility() {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
        let profile = ReturnAssumption::Normal {
            mean: 0.07,
            std_dev: 0.15,
        };
        let samples = profile.sample_sequence(&mut rng, 50_000).unwrap();
        let (mean, std_dev) = moments(&samples);
        assert!((mean - 0.07).abs() < 0.005, "mean was {mean}");
        assert!((std_dev - 0.15).abs() < 0.005, "std_dev was {std_dev}");
    }

    #[test]
    fn test_lognormal_matches_arithmetic_mean() {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(11);
        let profile = ReturnAssumption::LogNormal {
            mean: 0.06,
            std_dev: 0.10,
        };
        let samples = profile.sample_sequence(&mut rng, 50_000).unwrap();
        let (mean, std_dev) = moments(&samples);
        assert!((mean - 0.06).abs() < 0.005, "mean was {mean}");
        assert!((std_dev - 0.10).abs() < 0.005, "std_dev was {std_dev}");
        assert!(samples.iter().all(|r| *r > -1.0));
    }

    #[test]
    fn test_invalid_volatility_is_rejected() {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
        let profile = ReturnAssumption::Normal {
            mean: 0.05,
            std_dev: -1.0,
        };
        assert!(matches!(
            profile.sample(&mut rng),
            Err(MonteCarloError::InvalidDistribution { .. })
        ));
    }
}
