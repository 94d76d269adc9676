//! Retirement projection library
//!
//! A year-by-year retirement projection engine with tax-aware strategies:
//! - Accounts by tax treatment (tax-deferred, tax-free, taxable, HSA), real
//!   assets and debts
//! - Federal, state, FICA and NIIT taxes with progressive brackets
//! - Required Minimum Distributions from the IRS Uniform Lifetime Table
//! - Pluggable strategy rules (Roth conversions, backdoor and mega-backdoor
//!   Roth, QCDs, tax-loss harvesting) run in dependency order
//! - Proportional, tax-efficient and tax-aware withdrawal ordering
//! - Monte Carlo scenarios over randomized market returns
//!
//! # Builder DSL
//!
//! ```ignore
//! use retireplan_core::{AccountBuilder, PlanBuilder, run_projection};
//!
//! let plan = PlanBuilder::new()
//!     .ages(58, 62)
//!     .start_year(2025)
//!     .account(AccountBuilder::traditional_401k("401k").balance(900_000))
//!     .account(AccountBuilder::roth_ira("Roth").balance(150_000))
//!     .account(AccountBuilder::taxable_brokerage("Brokerage").balance(200_000).cost_basis(140_000))
//!     .retirement_spending(90_000)
//!     .social_security(67, 36_000)
//!     .build();
//!
//! let outcome = run_projection(&plan, 35)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod calculators;
pub mod error;
pub mod monte_carlo;
pub mod projection;
pub mod rules;
pub mod taxes;
pub mod withdrawal;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{AccountBuilder, ExpenseBuilder, IncomeBuilder, PlanBuilder};
pub use error::{ConfigError, MonteCarloError, RuleError};
pub use monte_carlo::{MonteCarloConfig, run_monte_carlo, run_monte_carlo_with_cancel};
pub use projection::{project, run_projection};
pub use rules::{RuleEngine, RuleKind, RuleRegistry};
