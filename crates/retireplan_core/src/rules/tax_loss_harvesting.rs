//! Tax-loss harvesting rule
//!
//! Realizes unrealized losses in taxable accounts. Only the cost basis moves:
//! the balance is unchanged and the basis drops by the realized loss, so the
//! loss is recognised now and future gains grow by the same amount.

use crate::calculators::{find_harvest_candidates, plan_harvest};
use crate::error::RuleError;
use crate::model::{
    BalanceModification, HarvestStrategy, RuleOutputs, RuleResult, TaxEffects,
    TaxLossHarvestingSettings,
};
use crate::taxes::marginal_rate;

use super::{ParamSpec, Rule, RuleCategory, RuleContext, RuleMetadata};

const NAME: &str = "tax_loss_harvesting";

#[derive(Debug, Clone, PartialEq)]
pub struct TaxLossHarvestingRule {
    pub settings: TaxLossHarvestingSettings,
}

impl TaxLossHarvestingRule {
    #[must_use]
    pub fn new(settings: TaxLossHarvestingSettings) -> Self {
        Self { settings }
    }
}

impl Rule for TaxLossHarvestingRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: NAME,
            description: "Realize unrealized losses in taxable accounts to offset gains",
            category: RuleCategory::TaxOptimization,
            dependencies: self.settings.depends_on.clone(),
        }
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new(
                "min_loss_threshold",
                "Smallest harvest worth realizing",
                1_000.0,
                0.0,
                1_000_000.0,
            )
            .with_value(self.settings.min_loss_threshold.to_dollars()),
            ParamSpec::new(
                "wash_sale_haircut",
                "Share of the harvest disallowed by wash sales",
                0.0,
                0.0,
                1.0,
            )
            .with_value(self.settings.wash_sale_haircut),
        ]
    }

    fn is_applicable(&self, ctx: &RuleContext<'_>) -> bool {
        self.settings.enabled
            && ctx
                .state
                .accounts
                .iter()
                .any(|a| a.has_tracked_basis() && a.unrealized_loss().is_positive())
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Result<RuleResult, RuleError> {
        let state = ctx.state;
        let candidates = find_harvest_candidates(&state.accounts);
        if candidates.is_empty() {
            return Ok(RuleResult::not_applied(NAME, "no unrealized losses"));
        }
        let gains = state.totals.capital_gains;
        if self.settings.strategy == HarvestStrategy::OffsetGains && !gains.is_positive() {
            return Ok(RuleResult::not_applied(NAME, "no capital gains to offset"));
        }

        let Some(harvest) = plan_harvest(
            &candidates,
            self.settings.strategy,
            gains,
            self.settings.min_loss_threshold,
            self.settings.wash_sale_haircut,
        ) else {
            return Ok(RuleResult::not_applied(
                NAME,
                "harvestable loss below the minimum threshold",
            ));
        };

        let mut result = RuleResult::applied(NAME);
        for &(idx, realized) in &harvest.per_account {
            let account = state.account(idx)?;
            let basis = account.cost_basis.unwrap_or(account.balance);
            result = result.with_modification(BalanceModification::cost_basis(
                idx,
                (basis - realized).non_negative(),
                "tax-loss harvest",
            ));
        }

        // Benefit at the long-term gains rate the offset gains would have paid
        let profile = &ctx.plan.tax_profile;
        let ordinary_taxable =
            (ctx.projected_ordinary_income() - profile.federal.standard_deduction).non_negative();
        let gains_table = profile
            .federal
            .capital_gains_brackets
            .as_deref()
            .unwrap_or(&profile.federal.ordinary_brackets);
        let rate = marginal_rate(ordinary_taxable + gains, gains_table)
            + if profile.state.no_income_tax {
                0.0
            } else {
                marginal_rate(ordinary_taxable + gains, &profile.state.ordinary_brackets)
            };
        if !rate.is_finite() {
            return Err(RuleError::NonFinite("tax-loss harvesting rate"));
        }

        Ok(result
            .with_outputs(RuleOutputs {
                harvested_loss: harvest.realized,
                tax_benefit: harvest.realized.scale(rate),
                ..Default::default()
            })
            .with_tax_effects(TaxEffects {
                capital_losses: harvest.realized,
                ..Default::default()
            }))
    }
}
