//! Projection results and rule records
//!
//! Contains the output types from running projections: the per-year
//! `SimulationResult` rows, the per-year rule report, and the Monte Carlo
//! aggregates.

use serde::{Deserialize, Serialize};

use super::accounts::AccountKind;
use super::ids::AccountId;
use super::money::Cents;
use super::state::ProjectionPhase;

// ============================================================================
// Rule records
// ============================================================================

/// The atomic unit by which a rule communicates a balance change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceModification {
    pub account_index: usize,
    /// Signed change in cents
    pub delta: Cents,
    pub reason: String,
    /// Replaces the account's cost basis when present
    #[serde(default)]
    pub cost_basis_override: Option<Cents>,
}

impl BalanceModification {
    #[must_use]
    pub fn new(account_index: usize, delta: Cents, reason: impl Into<String>) -> Self {
        Self {
            account_index,
            delta,
            reason: reason.into(),
            cost_basis_override: None,
        }
    }

    /// Basis-only change, the balance is untouched
    #[must_use]
    pub fn cost_basis(account_index: usize, basis: Cents, reason: impl Into<String>) -> Self {
        Self {
            account_index,
            delta: Cents::ZERO,
            reason: reason.into(),
            cost_basis_override: Some(basis),
        }
    }
}

/// Scalar outputs reported by a rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOutputs {
    pub contribution_amount: Cents,
    pub conversion_amount: Cents,
    pub taxable_amount: Cents,
    pub non_taxable_amount: Cents,
    pub qcd_amount: Cents,
    pub harvested_loss: Cents,
    /// Estimated tax created by the action
    pub tax_cost: Cents,
    /// Estimated tax avoided by the action
    pub tax_benefit: Cents,
}

impl std::ops::AddAssign for RuleOutputs {
    fn add_assign(&mut self, rhs: RuleOutputs) {
        self.contribution_amount += rhs.contribution_amount;
        self.conversion_amount += rhs.conversion_amount;
        self.taxable_amount += rhs.taxable_amount;
        self.non_taxable_amount += rhs.non_taxable_amount;
        self.qcd_amount += rhs.qcd_amount;
        self.harvested_loss += rhs.harvested_loss;
        self.tax_cost += rhs.tax_cost;
        self.tax_benefit += rhs.tax_benefit;
    }
}

/// Effect of a rule on the year's running tax totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxEffects {
    /// Added to ordinary income
    pub ordinary_income: Cents,
    /// Realized capital losses
    pub capital_losses: Cents,
    /// Counts toward this year's RMD
    pub rmd_satisfied: Cents,
}

/// Outcome of one rule invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_name: String,
    pub applied: bool,
    pub outputs: RuleOutputs,
    pub tax_effects: TaxEffects,
    pub modifications: Vec<BalanceModification>,
    /// Why the rule did nothing, when it did nothing
    pub reason: Option<String>,
}

impl RuleResult {
    #[must_use]
    pub fn applied(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            applied: true,
            outputs: RuleOutputs::default(),
            tax_effects: TaxEffects::default(),
            modifications: Vec::new(),
            reason: None,
        }
    }

    #[must_use]
    pub fn not_applied(rule_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            applied: false,
            outputs: RuleOutputs::default(),
            tax_effects: TaxEffects::default(),
            modifications: Vec::new(),
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn with_outputs(mut self, outputs: RuleOutputs) -> Self {
        self.outputs = outputs;
        self
    }

    #[must_use]
    pub fn with_tax_effects(mut self, tax_effects: TaxEffects) -> Self {
        self.tax_effects = tax_effects;
        self
    }

    #[must_use]
    pub fn with_modification(mut self, modification: BalanceModification) -> Self {
        self.modifications.push(modification);
        self
    }
}

/// A rule that did not run (or ran and declined) in a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRule {
    pub rule: String,
    pub reason: String,
}

/// A rule whose `apply` failed, isolated from the rest of the year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleErrorEntry {
    pub year: i16,
    pub year_offset: u32,
    pub rule: String,
    pub message: String,
    pub timestamp: jiff::Timestamp,
}

/// Rule-level detail for one projected year
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YearRuleReport {
    pub year_offset: u32,
    pub year: i16,
    pub applied_rules: Vec<RuleResult>,
    pub skipped_rules: Vec<SkippedRule>,
    pub errors: Vec<RuleErrorEntry>,
    pub warnings: Vec<String>,
}

impl YearRuleReport {
    #[must_use]
    pub fn new(year_offset: u32, year: i16) -> Self {
        Self {
            year_offset,
            year,
            ..Default::default()
        }
    }

    /// Total estimated tax cost of the applied rules
    #[must_use]
    pub fn rule_tax_cost(&self) -> Cents {
        self.applied_rules.iter().map(|r| r.outputs.tax_cost).sum()
    }
}

// ============================================================================
// Yearly projection rows
// ============================================================================

/// Tax owed for one year, by component
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxImpact {
    pub federal_income_tax: Cents,
    pub capital_gains_tax: Cents,
    pub state_tax: Cents,
    pub fica: Cents,
    pub niit: Cents,
    pub early_withdrawal_penalty: Cents,
    pub total: Cents,
    pub marginal_rate: f64,
    pub effective_rate: f64,
}

/// One account's movement through a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountYear {
    pub account_id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    pub starting_balance: Cents,
    pub growth: Cents,
    pub contributions: Cents,
    /// Net balance change from rule actions (conversions, QCDs)
    pub rule_adjustments: Cents,
    pub withdrawals: Cents,
    pub ending_balance: Cents,
    pub cost_basis: Option<Cents>,
}

/// Output row for one projected year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub year_offset: u32,
    pub year: i16,
    pub age: u32,
    pub phase: ProjectionPhase,
    /// Withdrawable balance at the start of the year
    pub starting_balance: Cents,
    pub growth: Cents,
    pub contributions: Cents,
    /// Gross non-Social Security income
    pub income: Cents,
    pub social_security: Cents,
    /// Spending target for the year (nominal)
    pub spending: Cents,
    pub withdrawals: Cents,
    pub rmd_required: Cents,
    /// Spending that could not be funded
    pub shortfall: Cents,
    pub tax: TaxImpact,
    /// Withdrawable balance at the end of the year
    pub ending_balance: Cents,
    pub net_worth: Cents,
    pub inflation_factor: f64,
    /// Ending balance in start-year dollars
    pub real_ending_balance: Cents,
    /// Spending in start-year dollars
    pub real_spending: Cents,
    pub accounts: Vec<AccountYear>,
}

/// Everything a deterministic projection produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOutcome {
    /// One row per emitted year; shorter than requested after depletion
    pub years: Vec<SimulationResult>,
    pub rule_reports: Vec<YearRuleReport>,
    pub final_phase: ProjectionPhase,
    /// Year offset in which the plan depleted
    pub depleted_at: Option<u32>,
}

impl ProjectionOutcome {
    #[must_use]
    pub fn final_balance(&self) -> Cents {
        self.years
            .last()
            .map(|y| y.ending_balance)
            .unwrap_or(Cents::ZERO)
    }

    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.final_phase == ProjectionPhase::Depleted
    }

    /// All per-rule errors across years
    pub fn rule_errors(&self) -> impl Iterator<Item = &RuleErrorEntry> {
        self.rule_reports.iter().flat_map(|r| r.errors.iter())
    }
}

// ============================================================================
// Monte Carlo aggregates
// ============================================================================

/// Final-balance percentile bands
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    pub p10: Cents,
    pub p25: Cents,
    pub p50: Cents,
    pub p75: Cents,
    pub p90: Cents,
}

/// Early vs late failures relative to the horizon midpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceRiskReport {
    pub early_failures: usize,
    pub late_failures: usize,
    /// Share of failures that happened in the first half of the horizon
    pub early_failure_share: f64,
    pub average_depletion_offset: Option<f64>,
}

/// Summary of one scenario, kept so callers can inspect the distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub seed: u64,
    pub final_balance: Cents,
    pub depleted_at: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub scenarios: usize,
    pub years: u32,
    /// Fraction of scenarios that never depleted
    pub success_rate: f64,
    pub mean_final_balance: Cents,
    pub percentiles: PercentileBands,
    pub sequence_risk: SequenceRiskReport,
    pub outcomes: Vec<ScenarioOutcome>,
}
