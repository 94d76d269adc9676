//! Property tests
//!
//! Invariants that must hold for any plan, not just hand-picked ones.

use proptest::prelude::*;

use crate::calculators::{calculate_rmd, pro_rata_split};
use crate::config::{AccountBuilder, PlanBuilder};
use crate::model::{Cents, FilingStatus, Plan, RmdTable, StrategySettings};
use crate::projection::run_projection;
use crate::rules::{RuleEngine, RuleKind};

fn settings_with_dependencies(kinds: &[RuleKind], deps: &[Vec<String>]) -> StrategySettings {
    let mut settings = StrategySettings::default();
    settings.roth_conversion.enabled = true;
    settings.backdoor_roth.enabled = true;
    settings.mega_backdoor_roth.enabled = true;
    settings.qcd.enabled = true;
    settings.tax_loss_harvesting.enabled = true;
    for (kind, depends_on) in kinds.iter().zip(deps) {
        let slot = match kind {
            RuleKind::RothConversion => &mut settings.roth_conversion.depends_on,
            RuleKind::BackdoorRoth => &mut settings.backdoor_roth.depends_on,
            RuleKind::MegaBackdoorRoth => &mut settings.mega_backdoor_roth.depends_on,
            RuleKind::Qcd => &mut settings.qcd.depends_on,
            RuleKind::TaxLossHarvesting => &mut settings.tax_loss_harvesting.depends_on,
        };
        slot.clone_from(depends_on);
    }
    settings
}

proptest! {
    #[test]
    fn test_pro_rata_parts_sum_to_contribution(
        preexisting in 0i64..1_000_000_000,
        contribution in 0i64..1_000_000,
    ) {
        let split = pro_rata_split(Cents(preexisting), Cents(contribution));
        prop_assert_eq!(split.taxable + split.non_taxable, Cents(contribution));
        prop_assert!(split.taxable <= Cents(contribution));
        let total = preexisting + contribution;
        if total > 0 {
            let expected = contribution as f64 * preexisting as f64 / total as f64;
            prop_assert!((split.taxable.0 as f64 - expected).abs() <= 0.5 + 1e-6);
            prop_assert!((split.ratio - preexisting as f64 / total as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rmd_is_zero_before_start_and_balance_over_divisor_after(
        balance in 100_000i64..10_000_000_000,
        age in 60u32..115,
    ) {
        let table = RmdTable::default();
        let rmd = calculate_rmd(Cents(balance), age, 73, &table);
        if age < 73 {
            prop_assert_eq!(rmd, Cents::ZERO);
        } else {
            let divisor = table.divisor_at_or_after(age).unwrap();
            prop_assert!(rmd.is_positive());
            prop_assert_eq!(rmd, Cents((balance as f64 / divisor).round() as i64));
        }
    }

    #[test]
    fn test_execution_order_respects_dependencies(
        kinds in Just(RuleKind::ALL.to_vec()).prop_shuffle(),
        edges in prop::collection::vec(any::<bool>(), 10),
    ) {
        // edges only point backwards in the shuffled order, so the graph is acyclic
        let mut deps = vec![Vec::new(); kinds.len()];
        let mut edge = edges.iter();
        for i in 0..kinds.len() {
            for j in 0..i {
                if edge.next().copied().unwrap_or(false) {
                    deps[i].push(kinds[j].name().to_string());
                }
            }
        }
        let plan = Plan {
            strategies: settings_with_dependencies(&kinds, &deps),
            ..Plan::default()
        };
        let engine = RuleEngine::from_plan(&plan).unwrap();
        let order = engine.execution_order();
        prop_assert_eq!(order.len(), kinds.len());
        for (kind, depends_on) in kinds.iter().zip(&deps) {
            let at = order.iter().position(|n| *n == kind.name()).unwrap();
            for dep in depends_on {
                let dep_at = order.iter().position(|n| *n == dep.as_str()).unwrap();
                prop_assert!(dep_at < at, "{} must run before {}", dep, kind.name());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_balances_never_negative(
        current_age in 30u32..85,
        years_to_retirement in 0u32..20,
        ira in 0i64..2_000_000,
        roth in 0i64..500_000,
        brokerage in 0i64..500_000,
        spending in 0i64..200_000,
        growth in -0.3f64..0.2,
    ) {
        let plan = PlanBuilder::new()
            .ages(current_age, current_age + years_to_retirement)
            .start_year(2025)
            .filing(FilingStatus::Single, "CA")
            .growth(growth)
            .account(AccountBuilder::traditional_ira("IRA").balance(ira))
            .account(AccountBuilder::roth_ira("Roth").balance(roth))
            .account(
                AccountBuilder::taxable_brokerage("Brokerage")
                    .balance(brokerage)
                    .cost_basis(brokerage / 2),
            )
            .retirement_spending(spending)
            .build();
        let outcome = run_projection(&plan, 30).unwrap();

        for year in &outcome.years {
            prop_assert!(year.ending_balance >= Cents::ZERO);
            prop_assert!(year.shortfall >= Cents::ZERO);
            for account in &year.accounts {
                prop_assert!(
                    account.ending_balance >= Cents::ZERO,
                    "{} went negative",
                    account.name
                );
            }
        }
        match outcome.depleted_at {
            Some(offset) => {
                prop_assert_eq!(outcome.years.len() as u32, offset + 1);
                prop_assert_eq!(outcome.final_balance(), Cents::ZERO);
            }
            None => prop_assert_eq!(outcome.years.len(), 30),
        }
    }
}
