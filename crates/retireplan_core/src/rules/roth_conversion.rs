//! Roth conversion rule
//!
//! Moves money from traditional accounts into a Roth account, sized by one of
//! three strategies. The converted amount is ordinary income for the year.
//! No conversion happens in the first projection year.

use crate::calculators::{bracket_fill_conversion, fixed_conversion, percentage_conversion};
use crate::error::RuleError;
use crate::model::{
    BalanceModification, Cents, ConversionStrategy, RothConversionSettings, RuleOutputs,
    RuleResult, TaxEffects,
};
use crate::taxes::combined_marginal_rate;

use super::{ParamSpec, Rule, RuleCategory, RuleContext, RuleMetadata};

const NAME: &str = "roth_conversion";

#[derive(Debug, Clone, PartialEq)]
pub struct RothConversionRule {
    pub settings: RothConversionSettings,
}

impl RothConversionRule {
    #[must_use]
    pub fn new(settings: RothConversionSettings) -> Self {
        Self { settings }
    }

    fn in_age_window(&self, age: u32) -> bool {
        self.settings.start_age.is_none_or(|s| age >= s)
            && self.settings.end_age.is_none_or(|e| age <= e)
    }
}

impl Rule for RothConversionRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: NAME,
            description: "Convert traditional balances to Roth by a fixed amount, \
                          to fill a tax bracket, or by a percentage of the balance",
            category: RuleCategory::TaxOptimization,
            dependencies: self.settings.depends_on.clone(),
        }
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        let mut params = match self.settings.strategy {
            ConversionStrategy::Fixed { annual_amount } => vec![
                ParamSpec::new(
                    "annual_amount",
                    "Dollars converted per year",
                    20_000.0,
                    0.0,
                    10_000_000.0,
                )
                .with_value(annual_amount.to_dollars()),
            ],
            ConversionStrategy::BracketFill { target_rate } => vec![
                ParamSpec::new(
                    "target_rate",
                    "Rate of the bracket whose ceiling is filled",
                    0.22,
                    0.0,
                    1.0,
                )
                .with_value(target_rate),
            ],
            ConversionStrategy::Percentage { fraction } => vec![
                ParamSpec::new(
                    "fraction",
                    "Share of the traditional balance converted per year",
                    0.1,
                    0.0,
                    1.0,
                )
                .with_value(fraction),
            ],
        };
        if let Some(rate) = self.settings.estimated_tax_rate {
            params.push(
                ParamSpec::new(
                    "estimated_tax_rate",
                    "Flat rate applied to the converted amount",
                    0.22,
                    0.0,
                    1.0,
                )
                .with_value(rate),
            );
        }
        params
    }

    fn is_applicable(&self, ctx: &RuleContext<'_>) -> bool {
        self.settings.enabled
            && self.in_age_window(ctx.age())
            && ctx.state.balance_where(|a| a.is_traditional()).is_positive()
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Result<RuleResult, RuleError> {
        if ctx.year_offset == 0 {
            return Ok(RuleResult::not_applied(
                NAME,
                "no conversion in the first projection year",
            ));
        }
        let Some(roth_idx) = ctx.state.find_account(|a| a.is_roth()) else {
            return Ok(RuleResult::not_applied(NAME, "no Roth account found"));
        };

        let state = ctx.state;
        let traditional: Vec<usize> = (0..state.accounts.len())
            .filter(|&i| {
                state.accounts[i].is_traditional() && state.accounts[i].balance.is_positive()
            })
            .collect();
        let traditional_balance: Cents =
            traditional.iter().map(|&i| state.accounts[i].balance).sum();
        let rmd_outstanding = state.totals.rmd_outstanding();
        let convertible = (traditional_balance - rmd_outstanding).non_negative();
        let income = ctx.projected_ordinary_income();
        let profile = &ctx.plan.tax_profile;

        let amount = match self.settings.strategy {
            ConversionStrategy::Fixed { annual_amount } => {
                fixed_conversion(annual_amount, traditional_balance, rmd_outstanding)
            }
            ConversionStrategy::BracketFill { target_rate } => {
                let ceiling = profile.federal.bracket_ceiling_for_rate(target_rate).ok_or(
                    RuleError::BracketNotFound {
                        table: "federal ordinary",
                        rate: target_rate,
                    },
                )?;
                let taxable_income = (income - profile.federal.standard_deduction).non_negative();
                bracket_fill_conversion(taxable_income, ceiling, convertible)
            }
            ConversionStrategy::Percentage { fraction } => {
                percentage_conversion(fraction, traditional_balance).min(convertible)
            }
        };

        if !amount.is_positive() {
            let reason = match self.settings.strategy {
                ConversionStrategy::BracketFill { .. } => {
                    "taxable income already at or above the target bracket ceiling"
                }
                _ => "no convertible traditional balance",
            };
            return Ok(RuleResult::not_applied(NAME, reason));
        }

        let rate = self
            .settings
            .estimated_tax_rate
            .unwrap_or_else(|| combined_marginal_rate(income, profile));
        if !rate.is_finite() {
            return Err(RuleError::NonFinite("roth conversion tax rate"));
        }

        // Draw from traditional accounts in plan order, leaving each account's RMD
        let mut result = RuleResult::applied(NAME);
        let mut remaining = amount;
        for idx in traditional {
            if !remaining.is_positive() {
                break;
            }
            let available =
                (state.accounts[idx].balance - state.rmd_outstanding_for(idx)).non_negative();
            let take = available.min(remaining);
            if take.is_positive() {
                result = result.with_modification(BalanceModification::new(
                    idx,
                    -take,
                    "roth conversion out",
                ));
                remaining -= take;
            }
        }
        let converted = amount - remaining;

        Ok(result
            .with_modification(BalanceModification::new(roth_idx, converted, "roth conversion in"))
            .with_outputs(RuleOutputs {
                conversion_amount: converted,
                taxable_amount: converted,
                tax_cost: converted.scale(rate),
                ..Default::default()
            })
            .with_tax_effects(TaxEffects {
                ordinary_income: converted,
                ..Default::default()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Account, AccountId, AccountKind, Plan, ProjectionState, YearMetadata,
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

    fn state(year_offset: u32, accounts: Vec<Account>) -> ProjectionState {
        ProjectionState::new(
            YearMetadata {
                year_offset,
                calendar_year: 2025 + year_offset as i16,
                age: 62,
                is_retired: true,
            },
            accounts,
        )
    }

    fn rule(strategy: ConversionStrategy, rate: Option<f64>) -> RothConversionRule {
        RothConversionRule::new(RothConversionSettings {
            enabled: true,
            strategy,
            estimated_tax_rate: rate,
            ..Default::default()
        })
    }

    #[test]
    fn test_fixed_conversion_with_estimated_rate() {
        let plan = Plan::default();
        let state = state(
            1,
            vec![
                account(0, AccountKind::TraditionalIra, 50_000),
                account(1, AccountKind::Roth, 0),
            ],
        );
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 1,
            state: &state,
        };
        let rule = rule(
            ConversionStrategy::Fixed {
                annual_amount: d(20_000),
            },
            Some(0.25),
        );
        assert!(rule.is_applicable(&ctx));
        let result = rule.apply(&ctx).unwrap();
        assert!(result.applied);
        assert_eq!(result.outputs.conversion_amount, d(20_000));
        assert_eq!(result.outputs.tax_cost, d(5_000));
        assert_eq!(result.tax_effects.ordinary_income, d(20_000));
        assert_eq!(
            result.modifications,
            vec![
                BalanceModification::new(0, d(-20_000), "roth conversion out"),
                BalanceModification::new(1, d(20_000), "roth conversion in"),
            ]
        );
    }

    #[test]
    fn test_no_conversion_in_first_year() {
        let plan = Plan::default();
        let state = state(
            0,
            vec![
                account(0, AccountKind::TraditionalIra, 50_000),
                account(1, AccountKind::Roth, 0),
            ],
        );
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &state,
        };
        let result = rule(
            ConversionStrategy::Fixed {
                annual_amount: d(20_000),
            },
            Some(0.25),
        )
        .apply(&ctx)
        .unwrap();
        assert!(!result.applied);
        assert!(result.modifications.is_empty());
    }

    #[test]
    fn test_missing_roth_is_soft_failure() {
        let plan = Plan::default();
        let state = state(2, vec![account(0, AccountKind::TraditionalIra, 50_000)]);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 2,
            state: &state,
        };
        let result = rule(ConversionStrategy::Percentage { fraction: 0.1 }, None)
            .apply(&ctx)
            .unwrap();
        assert!(!result.applied);
        assert_eq!(result.reason.as_deref(), Some("no Roth account found"));
    }

    #[test]
    fn test_bracket_fill_to_ceiling() {
        let plan = Plan::default();
        let mut state = state(
            3,
            vec![
                account(0, AccountKind::TraditionalIra, 500_000),
                account(1, AccountKind::Roth, 0),
            ],
        );
        // 14,600 deduction + 40,000 taxable = 54,600 gross
        state.totals.ordinary_income = d(54_600);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 3,
            state: &state,
        };
        let result = rule(ConversionStrategy::BracketFill { target_rate: 0.22 }, None)
            .apply(&ctx)
            .unwrap();
        // 22% single bracket tops out at 100,525
        assert_eq!(result.outputs.conversion_amount, d(60_525));
    }

    #[test]
    fn test_bracket_fill_unknown_rate_is_an_error() {
        let plan = Plan::default();
        let state = state(
            3,
            vec![
                account(0, AccountKind::TraditionalIra, 500_000),
                account(1, AccountKind::Roth, 0),
            ],
        );
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 3,
            state: &state,
        };
        let err = rule(ConversionStrategy::BracketFill { target_rate: 0.23 }, None)
            .apply(&ctx)
            .unwrap_err();
        assert!(matches!(err, RuleError::BracketNotFound { .. }));
    }

    #[test]
    fn test_out_of_bounds_parameter_rejected() {
        let rule = rule(ConversionStrategy::Percentage { fraction: 1.5 }, None);
        assert!(rule.validate().is_err());
    }
}
