//! Backdoor Roth rule
//!
//! A non-deductible traditional IRA contribution converted straight to Roth.
//! The pro-rata rule decides how much of the conversion is taxable when the
//! IRA already holds pre-tax money.

use crate::calculators::pro_rata_split;
use crate::error::RuleError;
use crate::model::{
    BACKDOOR_INCOME_CEILING, BackdoorRothSettings, BalanceModification, RuleOutputs, RuleResult,
    TaxEffects,
};
use crate::taxes::combined_marginal_rate;

use super::{ParamSpec, Rule, RuleCategory, RuleContext, RuleMetadata};

const NAME: &str = "backdoor_roth";

/// Minimum age to open and fund an IRA in this model
pub const MIN_AGE: u32 = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct BackdoorRothRule {
    pub settings: BackdoorRothSettings,
}

impl BackdoorRothRule {
    #[must_use]
    pub fn new(settings: BackdoorRothSettings) -> Self {
        Self { settings }
    }
}

impl Rule for BackdoorRothRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: NAME,
            description: "Non-deductible IRA contribution converted to Roth, taxed pro rata",
            category: RuleCategory::ContributionStrategy,
            dependencies: self.settings.depends_on.clone(),
        }
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        if let Some(amount) = self.settings.annual_amount {
            params.push(
                ParamSpec::new(
                    "annual_amount",
                    "Contribution per year",
                    7_000.0,
                    0.0,
                    100_000.0,
                )
                .with_value(amount.to_dollars()),
            );
        }
        params.push(
            ParamSpec::new(
                "income_ceiling",
                "Ordinary income above which the strategy is skipped",
                BACKDOOR_INCOME_CEILING.to_dollars(),
                0.0,
                1.0e9,
            )
            .with_value(self.settings.income_ceiling.to_dollars()),
        );
        params
    }

    fn is_applicable(&self, ctx: &RuleContext<'_>) -> bool {
        self.settings.enabled
            && ctx.age() >= MIN_AGE
            && ctx.state.totals.ordinary_income <= self.settings.income_ceiling
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Result<RuleResult, RuleError> {
        let Some(ira_idx) = ctx.state.find_account(|a| a.is_traditional_ira()) else {
            return Ok(RuleResult::not_applied(NAME, "no traditional IRA found"));
        };
        let Some(roth_idx) = ctx.state.find_account(|a| a.is_roth()) else {
            return Ok(RuleResult::not_applied(NAME, "no Roth account found"));
        };

        let limits = &ctx.plan.limits;
        let limit = if self.settings.use_catch_up {
            limits.ira_limit(ctx.age())
        } else {
            limits.ira
        };
        let contribution = self.settings.annual_amount.unwrap_or(limit).non_negative();
        if !contribution.is_positive() {
            return Ok(RuleResult::not_applied(NAME, "contribution amount is zero"));
        }

        let preexisting = ctx.state.balance_where(|a| a.is_traditional_ira());
        let split = pro_rata_split(preexisting, contribution);

        let rate = combined_marginal_rate(ctx.projected_ordinary_income(), &ctx.plan.tax_profile);
        if !rate.is_finite() {
            return Err(RuleError::NonFinite("backdoor roth tax rate"));
        }

        Ok(RuleResult::applied(NAME)
            .with_modification(BalanceModification::new(
                ira_idx,
                contribution,
                "non-deductible IRA contribution",
            ))
            .with_modification(BalanceModification::new(
                ira_idx,
                -contribution,
                "backdoor roth conversion out",
            ))
            .with_modification(BalanceModification::new(
                roth_idx,
                contribution,
                "backdoor roth conversion in",
            ))
            .with_outputs(RuleOutputs {
                contribution_amount: contribution,
                conversion_amount: contribution,
                taxable_amount: split.taxable,
                non_taxable_amount: split.non_taxable,
                tax_cost: split.taxable.scale(rate),
                ..Default::default()
            })
            .with_tax_effects(TaxEffects {
                ordinary_income: split.taxable,
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

    fn account(id: u16, kind: AccountKind, dollars: i64) -> Account {
        Account {
            account_id: AccountId(id),
            name: kind.label().into(),
            kind,
            balance: d(dollars),
            cost_basis: None,
            growth_rate: None,
            tax_character: kind.default_tax_character(),
            annual_contribution: Cents::ZERO,
            contribution_basis: Cents::ZERO,
        }
    }

    fn state(age: u32, accounts: Vec<Account>) -> ProjectionState {
        ProjectionState::new(
            YearMetadata {
                year_offset: 0,
                calendar_year: 2025,
                age,
                is_retired: false,
            },
            accounts,
        )
    }

    fn enabled() -> BackdoorRothRule {
        BackdoorRothRule::new(BackdoorRothSettings {
            enabled: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_clean_backdoor_is_tax_free() {
        let plan = Plan::default();
        let state = state(
            40,
            vec![
                account(0, AccountKind::TraditionalIra, 0),
                account(1, AccountKind::Roth, 10_000),
            ],
        );
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &state,
        };
        let result = enabled().apply(&ctx).unwrap();
        assert!(result.applied);
        assert_eq!(result.outputs.contribution_amount, d(7_000));
        assert_eq!(result.outputs.taxable_amount, Cents::ZERO);
        assert_eq!(result.outputs.non_taxable_amount, d(7_000));
        assert_eq!(result.modifications.len(), 3);
    }

    #[test]
    fn test_pro_rata_with_preexisting_balance() {
        let plan = Plan::default();
        let state = state(
            52,
            vec![
                account(0, AccountKind::TraditionalIra, 72_000),
                account(1, AccountKind::Roth, 0),
            ],
        );
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &state,
        };
        let result = enabled().apply(&ctx).unwrap();
        // catch-up limit 8,000; ratio 72,000 / 80,000 = 0.9
        assert_eq!(result.outputs.contribution_amount, d(8_000));
        assert_eq!(result.outputs.taxable_amount, d(7_200));
        assert_eq!(result.outputs.non_taxable_amount, d(800));
        assert_eq!(result.tax_effects.ordinary_income, d(7_200));
    }

    #[test]
    fn test_eligibility_gates() {
        let plan = Plan::default();
        let minor = state(17, vec![]);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &minor,
        };
        assert!(!enabled().is_applicable(&ctx));

        let mut high_income = state(40, vec![]);
        high_income.totals.ordinary_income = d(300_000);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &high_income,
        };
        let capped = BackdoorRothRule::new(BackdoorRothSettings {
            enabled: true,
            income_ceiling: d(250_000),
            ..Default::default()
        });
        assert!(!capped.is_applicable(&ctx));
        assert!(enabled().is_applicable(&ctx));

        // the default ceiling applies without any configuration
        let mut very_high = state(40, vec![]);
        very_high.totals.ordinary_income = d(50_000_000);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &very_high,
        };
        assert!(!enabled().is_applicable(&ctx));
    }

    #[test]
    fn test_income_ceiling_always_in_schema() {
        let params = enabled().parameters();
        let ceiling = params
            .iter()
            .find(|p| p.name == "income_ceiling")
            .unwrap();
        assert_eq!(ceiling.default, 1_000_000.0);
        assert_eq!(ceiling.value, 1_000_000.0);
        assert!(ceiling.in_bounds());
    }

    #[test]
    fn test_missing_accounts_reported() {
        let plan = Plan::default();
        let state = state(40, vec![account(0, AccountKind::Roth, 0)]);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &state,
        };
        let result = enabled().apply(&ctx).unwrap();
        assert!(!result.applied);
        assert_eq!(result.reason.as_deref(), Some("no traditional IRA found"));
    }
}
