//! Rule engine
//!
//! Runs the enabled rules in dependency order against one year's working
//! state. A rule that fails is recorded and skipped; the remaining rules and
//! the remaining years still run. Each rule's modifications are applied to
//! the state before the next rule runs, so dependent rules see them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RuleError};
use crate::model::{
    Plan, ProjectionState, RuleErrorEntry, RuleOutputs, RuleResult, SkippedRule, YearRuleReport,
};
use crate::projection::begin_year;

use super::{NOT_APPLICABLE, Rule, RuleCategory, RuleContext, RuleRegistry};

/// Aggregate of rule activity over a multi-year run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProjectionSummary {
    pub years_processed: u32,
    pub reports: Vec<YearRuleReport>,
    pub total_applied: usize,
    pub total_skipped: usize,
    pub total_errors: usize,
    /// `(rule, times applied)`, most frequent first, ties by name
    pub most_applied: Vec<(String, usize)>,
    pub category_counts: BTreeMap<RuleCategory, usize>,
    /// Errors per processed year
    pub error_rate: f64,
    /// Summed scalar outputs per rule
    pub totals_by_rule: BTreeMap<String, RuleOutputs>,
}

#[derive(Debug, Clone)]
pub struct RuleEngine {
    registry: RuleRegistry,
    order: Vec<usize>,
}

impl RuleEngine {
    /// Validate dependencies and fix the execution order.
    ///
    /// Any configuration problem aborts here, before a single year runs.
    pub fn new(registry: RuleRegistry) -> Result<Self, ConfigError> {
        let enabled = registry.enabled_names();
        let report = registry.validate_dependencies(&enabled);
        if !report.valid {
            return Err(ConfigError::MissingDependencies(report.missing));
        }
        let order = registry.ordered_indices()?;
        tracing::debug!(
            order = ?order.iter().map(|&i| registry.rule_at(i).name()).collect::<Vec<_>>(),
            "rule execution order"
        );
        Ok(Self { registry, order })
    }

    /// Engine for the rules a plan enables
    pub fn from_plan(plan: &Plan) -> Result<Self, ConfigError> {
        Self::new(RuleRegistry::from_plan(plan)?)
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    #[must_use]
    pub fn execution_order(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&idx| self.registry.rule_at(idx).name())
            .collect()
    }

    /// Run every enabled rule once for a year
    pub fn apply_rules_for_year(
        &self,
        plan: &Plan,
        year_offset: u32,
        state: &mut ProjectionState,
    ) -> YearRuleReport {
        let mut report = YearRuleReport::new(year_offset, state.meta.calendar_year);

        for &idx in &self.order {
            let rule = self.registry.rule_at(idx);
            let name = rule.name();
            let ctx = RuleContext {
                plan,
                year_offset,
                state: &*state,
            };

            if !rule.is_applicable(&ctx) {
                tracing::debug!(year = report.year, rule = name, "rule not applicable");
                report.skipped_rules.push(SkippedRule {
                    rule: name.to_string(),
                    reason: NOT_APPLICABLE.to_string(),
                });
                continue;
            }

            let outcome = rule
                .apply(&ctx)
                .and_then(|result| commit(state, result, &mut report.warnings));

            match outcome {
                Ok(result) if result.applied => {
                    tracing::debug!(
                        year = report.year,
                        rule = name,
                        modifications = result.modifications.len(),
                        "rule applied"
                    );
                    report.applied_rules.push(result);
                }
                Ok(result) => {
                    let reason = result.reason.unwrap_or_default();
                    tracing::debug!(year = report.year, rule = name, %reason, "rule skipped");
                    report.skipped_rules.push(SkippedRule {
                        rule: name.to_string(),
                        reason,
                    });
                }
                Err(error) => {
                    tracing::warn!(year = report.year, rule = name, %error, "rule failed");
                    report.errors.push(RuleErrorEntry {
                        year: report.year,
                        year_offset,
                        rule: name.to_string(),
                        message: error.to_string(),
                        timestamp: jiff::Timestamp::now(),
                    });
                }
            }
        }

        report
    }

    /// Run the rules over `years` years, evolving accounts by rule
    /// modifications only (no growth, spending or withdrawals). Income stays
    /// in today's dollars.
    pub fn apply_rules_for_projection(&self, plan: &Plan, years: u32) -> RuleProjectionSummary {
        let mut accounts = plan.accounts.clone();
        let mut reports = Vec::with_capacity(years as usize);
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut category_counts = BTreeMap::new();
        let mut totals_by_rule: BTreeMap<String, RuleOutputs> = BTreeMap::new();

        for year_offset in 0..years {
            let mut state = begin_year(plan, year_offset, accounts, 1.0);
            let report = self.apply_rules_for_year(plan, year_offset, &mut state);

            for result in &report.applied_rules {
                *counts.entry(result.rule_name.clone()).or_default() += 1;
                *totals_by_rule.entry(result.rule_name.clone()).or_default() += result.outputs;
                if let Some(rule) = self.registry.get(&result.rule_name) {
                    *category_counts.entry(rule.metadata().category).or_default() += 1;
                }
            }
            reports.push(report);
            accounts = state.accounts;
        }

        let total_applied = reports.iter().map(|r| r.applied_rules.len()).sum();
        let total_skipped = reports.iter().map(|r| r.skipped_rules.len()).sum();
        let total_errors: usize = reports.iter().map(|r| r.errors.len()).sum();

        let mut most_applied: Vec<(String, usize)> = counts.into_iter().collect();
        most_applied.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        tracing::info!(years, total_applied, total_errors, "rule projection finished");

        RuleProjectionSummary {
            years_processed: years,
            reports,
            total_applied,
            total_skipped,
            total_errors,
            most_applied,
            category_counts,
            error_rate: if years == 0 {
                0.0
            } else {
                total_errors as f64 / years as f64
            },
            totals_by_rule,
        }
    }
}

/// Apply a rule's modifications and fold its tax effects into the totals.
///
/// All account indices are checked before anything is applied, so a bad
/// result leaves the state untouched.
fn commit(
    state: &mut ProjectionState,
    mut result: RuleResult,
    warnings: &mut Vec<String>,
) -> Result<RuleResult, RuleError> {
    if !result.applied {
        return Ok(result);
    }
    if let Some(bad) = result
        .modifications
        .iter()
        .find(|m| m.account_index >= state.accounts.len())
    {
        return Err(RuleError::AccountOutOfRange(bad.account_index));
    }

    let mut applied = Vec::with_capacity(result.modifications.len());
    for modification in &result.modifications {
        let actual = state.apply_modification(modification)?;
        if actual.delta != modification.delta {
            warnings.push(format!(
                "{}: {} on account {} truncated from {} to {}",
                result.rule_name,
                modification.reason,
                modification.account_index,
                modification.delta,
                actual.delta
            ));
        }
        applied.push(actual);
    }
    result.modifications = applied;

    let totals = &mut state.totals;
    totals.ordinary_income += result.tax_effects.ordinary_income;
    totals.capital_losses += result.tax_effects.capital_losses;
    totals.rmd_satisfied += result.tax_effects.rmd_satisfied;
    totals.rule_tax_cost += result.outputs.tax_cost;
    Ok(result)
}
