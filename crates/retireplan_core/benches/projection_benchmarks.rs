//! Criterion benchmarks for retireplan_core projections
//!
//! Run with: cargo bench -p retireplan_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use retireplan_core::config::{AccountBuilder, IncomeBuilder, PlanBuilder};
use retireplan_core::model::{ConversionStrategy, Plan, QcdStrategy, ReturnAssumption};
use retireplan_core::monte_carlo::{MonteCarloConfig, run_monte_carlo};
use retireplan_core::projection::{project, run_projection};
use retireplan_core::rules::RuleEngine;

fn create_basic_plan() -> Plan {
    PlanBuilder::new()
        .ages(50, 62)
        .birth_year(1975)
        .start_year(2025)
        .account(
            AccountBuilder::traditional_401k("401k")
                .balance(800_000)
                .contribution(30_500),
        )
        .account(AccountBuilder::roth_ira("Roth").balance(120_000))
        .account(
            AccountBuilder::taxable_brokerage("Brokerage")
                .balance(300_000)
                .cost_basis(200_000),
        )
        .account(AccountBuilder::real_estate("House", 600_000).growth_rate(0.03))
        .account(AccountBuilder::loan("Mortgage", 250_000, 0.055).contribution(24_000))
        .income(IncomeBuilder::wages("Salary").amount(180_000).until_age(61))
        .retirement_spending(95_000)
        .social_security(67, 38_000)
        .build()
}

fn create_strategy_plan() -> Plan {
    let mut plan = create_basic_plan();
    plan.strategies.roth_conversion.enabled = true;
    plan.strategies.roth_conversion.strategy =
        ConversionStrategy::BracketFill { target_rate: 0.22 };
    plan.strategies.roth_conversion.start_age = Some(62);
    plan.strategies.roth_conversion.end_age = Some(72);
    plan.strategies.qcd.enabled = true;
    plan.strategies.qcd.strategy = QcdStrategy::RmdMatching;
    plan.strategies.tax_loss_harvesting.enabled = true;
    plan
}

fn bench_deterministic_projection(c: &mut Criterion) {
    let plan = create_basic_plan();

    c.bench_function("projection_40yr", |b| {
        b.iter(|| run_projection(black_box(&plan), black_box(40)))
    });
}

fn bench_projection_with_rules(c: &mut Criterion) {
    let plan = create_strategy_plan();
    let engine = RuleEngine::from_plan(&plan).expect("benchmark plan is valid");

    c.bench_function("projection_40yr_with_rules", |b| {
        b.iter(|| project(black_box(&plan), black_box(&engine), black_box(40), None))
    });
}

fn bench_monte_carlo(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo");
    let plan = create_strategy_plan();

    for scenarios in [100, 500, 1000].iter() {
        let config = MonteCarloConfig {
            scenarios: *scenarios,
            years: 40,
            seed: 42,
            returns: ReturnAssumption::US_BALANCED_60_40,
        };

        group.bench_with_input(
            BenchmarkId::new("scenarios", scenarios),
            scenarios,
            |b, _| b.iter(|| run_monte_carlo(black_box(&plan), black_box(&config))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_deterministic_projection,
    bench_projection_with_rules,
    bench_monte_carlo,
);
criterion_main!(benches);
