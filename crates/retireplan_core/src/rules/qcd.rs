//! Qualified charitable distribution rule
//!
//! Gives directly from traditional accounts to charity once the owner reaches
//! the eligible age. The gift counts toward the year's RMD and stays out of
//! taxable income.

use crate::calculators::{qcd_eligible, size_qcd};
use crate::error::RuleError;
use crate::model::{
    BalanceModification, QcdSettings, QcdStrategy, RuleOutputs, RuleResult, TaxEffects,
};
use crate::taxes::combined_marginal_rate;

use super::{ParamSpec, Rule, RuleCategory, RuleContext, RuleMetadata};

const NAME: &str = "qcd";

#[derive(Debug, Clone, PartialEq)]
pub struct QcdRule {
    pub settings: QcdSettings,
}

impl QcdRule {
    #[must_use]
    pub fn new(settings: QcdSettings) -> Self {
        Self { settings }
    }
}

impl Rule for QcdRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: NAME,
            description: "Qualified charitable distributions from traditional accounts",
            category: RuleCategory::WithdrawalStrategy,
            dependencies: self.settings.depends_on.clone(),
        }
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        match self.settings.strategy {
            QcdStrategy::Fixed { annual_amount } => params.push(
                ParamSpec::new(
                    "annual_amount",
                    "Total given per year",
                    10_000.0,
                    0.0,
                    10_000_000.0,
                )
                .with_value(annual_amount.to_dollars()),
            ),
            QcdStrategy::PercentageOfBalance { fraction } => params.push(
                ParamSpec::new(
                    "fraction",
                    "Share of each traditional balance given",
                    0.05,
                    0.0,
                    1.0,
                )
                .with_value(fraction),
            ),
            QcdStrategy::RmdMatching => {}
        }
        if let Some(cap) = self.settings.annual_cap {
            params.push(
                ParamSpec::new(
                    "annual_cap",
                    "Aggregate yearly QCD ceiling",
                    105_000.0,
                    0.0,
                    10_000_000.0,
                )
                .with_value(cap.to_dollars()),
            );
        }
        params
    }

    fn is_applicable(&self, ctx: &RuleContext<'_>) -> bool {
        let min_age = self
            .settings
            .min_age
            .unwrap_or_else(|| ctx.plan.rmd_start_age());
        self.settings.enabled
            && qcd_eligible(ctx.age(), min_age)
            && ctx.state.balance_where(|a| a.is_traditional()).is_positive()
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Result<RuleResult, RuleError> {
        let cap = self
            .settings
            .annual_cap
            .unwrap_or(ctx.plan.limits.qcd_annual);
        let allocation = size_qcd(
            self.settings.strategy,
            &ctx.state.accounts,
            &ctx.state.rmd_by_account,
            cap,
        );
        if !allocation.total.is_positive() {
            let reason = match self.settings.strategy {
                QcdStrategy::RmdMatching => "no RMD due this year",
                _ => "no QCD-eligible balance",
            };
            return Ok(RuleResult::not_applied(NAME, reason));
        }

        let rate = combined_marginal_rate(ctx.projected_ordinary_income(), &ctx.plan.tax_profile);
        if !rate.is_finite() {
            return Err(RuleError::NonFinite("qcd marginal rate"));
        }

        let mut result = RuleResult::applied(NAME);
        for &(idx, amount) in &allocation.per_account {
            result = result.with_modification(BalanceModification::new(
                idx,
                -amount,
                "qualified charitable distribution",
            ));
        }
        Ok(result
            .with_outputs(RuleOutputs {
                qcd_amount: allocation.total,
                non_taxable_amount: allocation.total,
                tax_benefit: allocation.total.scale(rate),
                ..Default::default()
            })
            .with_tax_effects(TaxEffects {
                rmd_satisfied: allocation.rmd_satisfied,
                ..Default::default()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Account, AccountId, AccountKind, Cents, Plan, ProjectionState, YearMetadata,
    };

    fn d(dollars: i64) -> Cents {
        Cents::from_dollars(dollars)
    }

    fn state(age: u32, ira_balance: i64, rmd: i64) -> ProjectionState {
        let mut state = ProjectionState::new(
            YearMetadata {
                year_offset: 5,
                calendar_year: 2030,
                age,
                is_retired: true,
            },
            vec![Account {
                account_id: AccountId(0),
                name: "IRA".into(),
                kind: AccountKind::TraditionalIra,
                balance: d(ira_balance),
                cost_basis: None,
                growth_rate: None,
                tax_character: AccountKind::TraditionalIra.default_tax_character(),
                annual_contribution: Cents::ZERO,
                contribution_basis: Cents::ZERO,
            }],
        );
        state.rmd_by_account[0] = d(rmd);
        state.totals.rmd_required = d(rmd);
        state
    }

    fn enabled(strategy: QcdStrategy) -> QcdRule {
        QcdRule::new(QcdSettings {
            enabled: true,
            strategy,
            ..Default::default()
        })
    }

    #[test]
    fn test_gated_by_rmd_age() {
        let plan = Plan::default();
        let young = state(70, 300_000, 0);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 5,
            state: &young,
        };
        assert!(!enabled(QcdStrategy::RmdMatching).is_applicable(&ctx));

        let eligible = state(73, 300_000, 11_321);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 5,
            state: &eligible,
        };
        assert!(enabled(QcdStrategy::RmdMatching).is_applicable(&ctx));
    }

    #[test]
    fn test_rmd_matching_satisfies_rmd() {
        let plan = Plan::default();
        let state = state(75, 246_000, 10_000);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 5,
            state: &state,
        };
        let result = enabled(QcdStrategy::RmdMatching).apply(&ctx).unwrap();
        assert!(result.applied);
        assert_eq!(result.outputs.qcd_amount, d(10_000));
        assert_eq!(result.tax_effects.rmd_satisfied, d(10_000));
        assert_eq!(result.tax_effects.ordinary_income, Cents::ZERO);
        assert_eq!(
            result.modifications,
            vec![BalanceModification::new(
                0,
                d(-10_000),
                "qualified charitable distribution"
            )]
        );
        assert!(result.outputs.tax_benefit.is_positive());
    }

    #[test]
    fn test_fixed_amount_partially_counts_toward_rmd() {
        let plan = Plan::default();
        let state = state(75, 246_000, 10_000);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 5,
            state: &state,
        };
        let result = enabled(QcdStrategy::Fixed {
            annual_amount: d(4_000),
        })
        .apply(&ctx)
        .unwrap();
        assert_eq!(result.outputs.qcd_amount, d(4_000));
        assert_eq!(result.tax_effects.rmd_satisfied, d(4_000));
    }
}
