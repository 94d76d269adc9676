//! Mega-backdoor Roth rule
//!
//! After-tax 401(k) contributions up to the room left under the combined
//! employee + employer limit, converted in service to Roth. The after-tax
//! basis is converted immediately, so the conversion carries no tax.

use crate::calculators::mega_backdoor_room;
use crate::error::RuleError;
use crate::model::{
    AccountKind, BalanceModification, MegaBackdoorRothSettings, RuleOutputs, RuleResult,
};

use super::{ParamSpec, Rule, RuleCategory, RuleContext, RuleMetadata};

const NAME: &str = "mega_backdoor_roth";

#[derive(Debug, Clone, PartialEq)]
pub struct MegaBackdoorRothRule {
    pub settings: MegaBackdoorRothSettings,
}

impl MegaBackdoorRothRule {
    #[must_use]
    pub fn new(settings: MegaBackdoorRothSettings) -> Self {
        Self { settings }
    }
}

impl Rule for MegaBackdoorRothRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: NAME,
            description: "After-tax 401(k) contributions converted in service to Roth",
            category: RuleCategory::ContributionStrategy,
            dependencies: self.settings.depends_on.clone(),
        }
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        let mut params = vec![
            ParamSpec::new(
                "annual_cap",
                "Upper bound on after-tax contributions",
                46_000.0,
                0.0,
                1_000_000.0,
            )
            .with_value(self.settings.annual_cap.to_dollars()),
            ParamSpec::new(
                "employer_match_rate",
                "Employer match as a share of wages",
                0.05,
                0.0,
                1.0,
            )
            .with_value(self.settings.employer_match_rate),
        ];
        if let Some(deferral) = self.settings.employee_deferral {
            params.push(
                ParamSpec::new(
                    "employee_deferral",
                    "Employee pre-tax deferral",
                    23_000.0,
                    0.0,
                    1_000_000.0,
                )
                .with_value(deferral.to_dollars()),
            );
        }
        params
    }

    fn is_applicable(&self, ctx: &RuleContext<'_>) -> bool {
        self.settings.enabled && !ctx.is_retired()
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Result<RuleResult, RuleError> {
        if !self.settings.plan_allows_after_tax {
            return Ok(RuleResult::not_applied(
                NAME,
                "401(k) plan does not allow after-tax contributions",
            ));
        }
        if !self.settings.plan_allows_in_service_conversion {
            return Ok(RuleResult::not_applied(
                NAME,
                "401(k) plan does not allow in-service conversions",
            ));
        }
        let Some(plan_idx) = ctx
            .state
            .find_account(|a| a.kind == AccountKind::Traditional401k)
        else {
            return Ok(RuleResult::not_applied(NAME, "no 401(k) account found"));
        };
        let Some(roth_idx) = ctx.state.find_account(|a| a.is_roth()) else {
            return Ok(RuleResult::not_applied(NAME, "no Roth account found"));
        };

        let limits = &ctx.plan.limits;
        let deferral_limit = limits.deferral_limit(ctx.age());
        let deferral = self.settings.employee_deferral.unwrap_or_else(|| {
            ctx.state.accounts[plan_idx]
                .annual_contribution
                .min(deferral_limit)
        });
        let room = mega_backdoor_room(
            limits.total_401k,
            deferral,
            ctx.state.totals.wages,
            self.settings.employer_match_rate,
            deferral_limit,
        );
        let amount = self.settings.annual_cap.non_negative().min(room);
        if !amount.is_positive() {
            return Ok(RuleResult::not_applied(
                NAME,
                "no room left under the combined 401(k) limit",
            ));
        }

        Ok(RuleResult::applied(NAME)
            .with_modification(BalanceModification::new(
                plan_idx,
                amount,
                "after-tax 401(k) contribution",
            ))
            .with_modification(BalanceModification::new(
                plan_idx,
                -amount,
                "in-service conversion out",
            ))
            .with_modification(BalanceModification::new(
                roth_idx,
                amount,
                "in-service conversion in",
            ))
            .with_outputs(RuleOutputs {
                contribution_amount: amount,
                conversion_amount: amount,
                non_taxable_amount: amount,
                ..Default::default()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, AccountId, Cents, Plan, ProjectionState, YearMetadata};

    fn d(dollars: i64) -> Cents {
        Cents::from_dollars(dollars)
    }

    fn account(id: u16, kind: AccountKind, dollars: i64, contribution: i64) -> Account {
        Account {
            account_id: AccountId(id),
            name: kind.label().into(),
            kind,
            balance: d(dollars),
            cost_basis: None,
            growth_rate: None,
            tax_character: kind.default_tax_character(),
            annual_contribution: d(contribution),
            contribution_basis: Cents::ZERO,
        }
    }

    fn working_state(wages: i64) -> ProjectionState {
        let mut state = ProjectionState::new(
            YearMetadata {
                year_offset: 0,
                calendar_year: 2025,
                age: 40,
                is_retired: false,
            },
            vec![
                account(0, AccountKind::Traditional401k, 100_000, 23_000),
                account(1, AccountKind::Roth, 20_000, 0),
            ],
        );
        state.totals.wages = d(wages);
        state
    }

    fn rule(after_tax: bool, in_service: bool) -> MegaBackdoorRothRule {
        MegaBackdoorRothRule::new(MegaBackdoorRothSettings {
            enabled: true,
            plan_allows_after_tax: after_tax,
            plan_allows_in_service_conversion: in_service,
            ..Default::default()
        })
    }

    #[test]
    fn test_sized_to_remaining_room() {
        let plan = Plan::default();
        let state = working_state(200_000);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &state,
        };
        let result = rule(true, true).apply(&ctx).unwrap();
        // 69,000 - 23,000 - 10,000 match = 36,000 < 46,000 cap
        assert!(result.applied);
        assert_eq!(result.outputs.contribution_amount, d(36_000));
        assert_eq!(result.outputs.tax_cost, Cents::ZERO);
        assert_eq!(result.tax_effects.ordinary_income, Cents::ZERO);
    }

    #[test]
    fn test_capped_by_annual_cap() {
        let plan = Plan::default();
        let state = working_state(0);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &state,
        };
        let result = rule(true, true).apply(&ctx).unwrap();
        assert_eq!(result.outputs.contribution_amount, d(46_000));
    }

    #[test]
    fn test_plan_flags_required() {
        let plan = Plan::default();
        let state = working_state(200_000);
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &state,
        };
        assert!(!rule(false, true).apply(&ctx).unwrap().applied);
        assert!(!rule(true, false).apply(&ctx).unwrap().applied);
    }

    #[test]
    fn test_not_applicable_once_retired() {
        let plan = Plan::default();
        let mut state = working_state(0);
        state.meta.is_retired = true;
        let ctx = RuleContext {
            plan: &plan,
            year_offset: 0,
            state: &state,
        };
        assert!(!rule(true, true).is_applicable(&ctx));
    }
}
