//! Deterministic year-by-year projection
//!
//! Each year starts from a fresh [`ProjectionState`] built from the prior
//! year's ending accounts:
//!
//! 1. Social Security and other income for the year
//! 2. Snapshot of starting balances
//! 3. Growth, appreciation and debt interest
//! 4. Contributions (while working), loan payments, inflated spending target
//! 5. Required minimum distributions from start-of-year balances
//! 6. Funding need = spending + tax - income, floored at the outstanding RMD
//! 7. Strategy rules in dependency order
//! 8. Withdrawals for the remaining need, grossed up for their own tax
//! 9. Ending balances (never negative)
//! 10. One [`SimulationResult`] row
//!
//! The run stops after the first year whose withdrawable balance ends at zero
//! while a withdrawal was needed.

use crate::calculators::{
    ConversionLot, consume_seasoned_conversions, penalty_free_amount, rmds_for_accounts,
    seasoned_conversions,
};
use crate::error::ConfigError;
use crate::model::{
    Account, AccountKind, AccountYear, BalanceModification, Cents, IncomeKind, MarketPath, Plan,
    ProjectionOutcome, ProjectionPhase, ProjectionState, SimulationResult, TaxCharacter,
    YearMetadata,
};
use crate::rules::RuleEngine;
use crate::taxes::{
    YearTaxInputs, YearTaxResult, calculate_year_tax, capital_gain_on_withdrawal,
    capital_loss_on_withdrawal,
};
use crate::withdrawal::{WithdrawalPlan, allocate_withdrawals};

/// Upper bound on tax gross-up passes per year
pub const MAX_GROSS_UP_PASSES: usize = 8;

/// Gross-up stops once the tax moves by less than this between passes
pub const GROSS_UP_TOLERANCE: Cents = Cents::from_dollars(1);

/// Project a plan with the rules it enables.
///
/// Rule configuration problems surface here, before any year is simulated.
pub fn run_projection(plan: &Plan, years: u32) -> Result<ProjectionOutcome, ConfigError> {
    let engine = RuleEngine::from_plan(plan)?;
    let outcome = project(plan, &engine, years, None);
    tracing::info!(
        years_requested = years,
        years_emitted = outcome.years.len(),
        final_phase = ?outcome.final_phase,
        rule_errors = outcome.rule_errors().count(),
        "projection finished"
    );
    Ok(outcome)
}

/// Cash received in a year, by tax treatment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IncomeTotals {
    pub wages: Cents,
    pub pension: Cents,
    pub capital_gains: Cents,
    pub tax_free: Cents,
}

impl IncomeTotals {
    #[must_use]
    pub fn gross(&self) -> Cents {
        self.wages + self.pension + self.capital_gains + self.tax_free
    }
}

/// Active incomes at `age`, inflated where configured
pub fn year_income(plan: &Plan, age: u32, inflation_factor: f64) -> IncomeTotals {
    let mut totals = IncomeTotals::default();
    for income in plan.incomes.iter().filter(|i| i.is_active(age)) {
        let amount = if income.inflation_adjusted {
            income.annual_amount.scale(inflation_factor)
        } else {
            income.annual_amount
        };
        match income.kind {
            IncomeKind::Wages => totals.wages += amount,
            IncomeKind::Pension => totals.pension += amount,
            IncomeKind::CapitalGains => totals.capital_gains += amount,
            IncomeKind::TaxFree => totals.tax_free += amount,
        }
    }
    totals
}

/// Social Security benefit received at `age`
pub fn social_security_benefit(plan: &Plan, age: u32, inflation_factor: f64) -> Cents {
    let ss = &plan.social_security;
    if !ss.enabled || age < ss.start_age {
        return Cents::ZERO;
    }
    if ss.inflation_adjusted {
        ss.annual_benefit.scale(inflation_factor)
    } else {
        ss.annual_benefit
    }
}

/// Fresh working state for a year: metadata, RMDs on the starting balances
/// and the year's income totals
pub fn begin_year(
    plan: &Plan,
    year_offset: u32,
    accounts: Vec<Account>,
    inflation_factor: f64,
) -> ProjectionState {
    let age = plan.age_at(year_offset);
    let meta = YearMetadata {
        year_offset,
        calendar_year: plan.calendar_year(year_offset),
        age,
        is_retired: plan.is_retired_at(year_offset),
    };
    let mut state = ProjectionState::new(meta, accounts);
    state.rmd_by_account = rmds_for_accounts(
        &state.accounts,
        age,
        plan.rmd_start_age(),
        &plan.assumptions.rmd_table,
    );

    let income = year_income(plan, age, inflation_factor);
    let totals = &mut state.totals;
    totals.wages = income.wages;
    totals.ordinary_income = income.wages + income.pension;
    totals.capital_gains = income.capital_gains;
    totals.social_security = social_security_benefit(plan, age, inflation_factor);
    totals.rmd_required = state.rmd_by_account.iter().sum();
    state
}

fn growth_rate(account: &Account, plan: &Plan, market_return: Option<f64>) -> f64 {
    if let Some(rate) = account.growth_rate {
        return rate;
    }
    match account.kind {
        AccountKind::Debt => 0.0,
        AccountKind::RealAsset => plan.assumptions.default_growth_rate,
        _ => market_return.unwrap_or(plan.assumptions.default_growth_rate),
    }
}

/// Tax for the year if `withdrawals` were taken from the current state
fn settle_year_tax(
    plan: &Plan,
    state: &ProjectionState,
    withdrawals: &WithdrawalPlan,
    lots: &[ConversionLot],
) -> YearTaxResult {
    let totals = &state.totals;
    let age = state.meta.age;
    let mut inputs = YearTaxInputs {
        wages: totals.wages,
        ordinary_income: (totals.ordinary_income - totals.pre_tax_contributions).non_negative(),
        social_security: totals.social_security,
        capital_gains: totals.capital_gains,
        capital_losses: totals.capital_losses,
        loss_carryforward: totals.loss_carryforward,
        penalized_withdrawals: Cents::ZERO,
    };

    let per_account = state.accounts.iter().zip(&withdrawals.per_account);
    for (idx, (account, &amount)) in per_account.enumerate() {
        if !amount.is_positive() {
            continue;
        }
        match account.tax_character {
            TaxCharacter::TaxDeferred => {
                inputs.ordinary_income += amount;
                inputs.penalized_withdrawals +=
                    amount - penalty_free_amount(account, age, amount, Cents::ZERO);
            }
            TaxCharacter::Taxable => {
                // untracked basis is treated as fully basis
                let basis = account.cost_basis.unwrap_or(account.balance);
                let (gain, _) = capital_gain_on_withdrawal(amount, account.balance, basis);
                inputs.capital_gains += gain;
                inputs.capital_losses +=
                    capital_loss_on_withdrawal(amount, account.balance, basis);
            }
            TaxCharacter::TaxFree => {
                let seasoned = seasoned_conversions(lots, idx, state.meta.year_offset);
                let early = amount - penalty_free_amount(account, age, amount, seasoned);
                inputs.ordinary_income += early;
                inputs.penalized_withdrawals += early;
            }
            TaxCharacter::TaxDeductible => {}
        }
    }

    calculate_year_tax(&inputs, &plan.tax_profile)
}

fn withdrawable_sum(values: &[Cents], accounts: &[Account]) -> Cents {
    values
        .iter()
        .zip(accounts)
        .filter(|(_, a)| a.is_withdrawable())
        .map(|(v, _)| *v)
        .sum()
}

/// Project `years` years with a prepared rule engine.
///
/// `market` overrides the growth rate of accounts without their own rate.
pub fn project(
    plan: &Plan,
    engine: &RuleEngine,
    years: u32,
    market: Option<&MarketPath>,
) -> ProjectionOutcome {
    let strategy = plan.assumptions.withdrawal_strategy;
    let mut accounts = plan.accounts.clone();
    let mut inflation_factor = 1.0;
    let mut carryforward = Cents::ZERO;
    let mut lots: Vec<ConversionLot> = Vec::new();
    let mut rows = Vec::with_capacity(years as usize);
    let mut rule_reports = Vec::with_capacity(years as usize);
    let mut phase = if plan.is_retired_at(0) {
        ProjectionPhase::Retired
    } else {
        ProjectionPhase::Accumulating
    };
    let mut depleted_at = None;

    for year_offset in 0..years {
        // (1) income, (5) RMDs on starting balances
        let mut state = begin_year(plan, year_offset, accounts, inflation_factor);
        state.totals.loss_carryforward = carryforward;
        let age = state.meta.age;
        let retired = state.meta.is_retired;
        phase = if retired {
            ProjectionPhase::Retired
        } else {
            ProjectionPhase::Accumulating
        };
        let n = state.accounts.len();

        // (2) snapshot
        let starting: Vec<Cents> = state.accounts.iter().map(|a| a.balance).collect();
        let starting_balance = state.withdrawable_balance();

        // (3) growth
        let market_return = market.and_then(|m| m.return_for(year_offset));
        let mut growth = vec![Cents::ZERO; n];
        for (idx, account) in state.accounts.iter_mut().enumerate() {
            let rate = growth_rate(account, plan, market_return);
            let grown = (account.balance + account.balance.scale(rate)).non_negative();
            growth[idx] = grown - account.balance;
            account.balance = grown;
        }

        // (4) contributions, loan payments, spending
        let mut contributions = vec![Cents::ZERO; n];
        let mut debt_payments = Cents::ZERO;
        let mut pre_tax = Cents::ZERO;
        for (idx, account) in state.accounts.iter_mut().enumerate() {
            if account.is_debt() {
                let payment = account.annual_contribution.non_negative().min(account.balance);
                account.balance -= payment;
                contributions[idx] = -payment;
                debt_payments += payment;
                continue;
            }
            if retired || !account.is_withdrawable() || !account.annual_contribution.is_positive() {
                continue;
            }
            let amount = match plan.limits.annual_limit(account.kind, age) {
                Some(limit) => account.annual_contribution.min(limit),
                None => account.annual_contribution,
            };
            account.balance += amount;
            contributions[idx] = amount;
            match account.tax_character {
                TaxCharacter::TaxDeferred | TaxCharacter::TaxDeductible => pre_tax += amount,
                TaxCharacter::TaxFree => account.contribution_basis += amount,
                TaxCharacter::Taxable => {
                    account.cost_basis = account.cost_basis.map(|b| b + amount);
                }
            }
        }
        state.totals.pre_tax_contributions = pre_tax;

        let spending_factor = if plan.assumptions.inflate_spending {
            inflation_factor
        } else {
            1.0
        };
        let mut spending = if retired {
            plan.retirement_spending.scale(spending_factor)
        } else {
            Cents::ZERO
        };
        for expense in plan.expenses.iter().filter(|e| e.is_active(age)) {
            spending += if expense.inflation_adjusted {
                expense.annual_amount.scale(inflation_factor)
            } else {
                expense.annual_amount
            };
        }
        spending += debt_payments;

        // (7) rules
        let before_rules: Vec<Cents> = state.accounts.iter().map(|a| a.balance).collect();
        let report = engine.apply_rules_for_year(plan, year_offset, &mut state);
        for result in &report.applied_rules {
            if !result.outputs.conversion_amount.is_positive() {
                continue;
            }
            for m in result.modifications.iter().filter(|m| m.delta.is_positive()) {
                if state.accounts[m.account_index].is_roth() {
                    lots.push(ConversionLot {
                        account_index: m.account_index,
                        year_offset,
                        amount: m.delta,
                    });
                }
            }
        }
        let rule_adjustments: Vec<Cents> = state
            .accounts
            .iter()
            .zip(&before_rules)
            .map(|(a, before)| a.balance - *before)
            .collect();

        // (6) + (8) need and withdrawals, grossed up for their own tax
        let income = year_income(plan, age, inflation_factor);
        let inflow = income.gross() + state.totals.social_security;
        let mandatory: Vec<Cents> = (0..n).map(|i| state.rmd_outstanding_for(i)).collect();
        let rmd_floor: Cents = mandatory.iter().sum();

        let mut withdrawals = WithdrawalPlan::empty(n);
        let mut tax = settle_year_tax(plan, &state, &withdrawals, &lots);
        for _ in 0..MAX_GROSS_UP_PASSES {
            let need = (spending + tax.impact.total - inflow).non_negative().max(rmd_floor);
            withdrawals = allocate_withdrawals(strategy, &state.accounts, need, &mandatory);
            let next = settle_year_tax(plan, &state, &withdrawals, &lots);
            let moved = Cents((next.impact.total - tax.impact.total).0.abs());
            tax = next;
            if moved < GROSS_UP_TOLERANCE {
                break;
            }
        }
        let deficit = (spending + tax.impact.total - inflow).non_negative();
        let need = deficit.max(rmd_floor);
        let shortfall = (need - withdrawals.total).non_negative();

        // (9) fold withdrawals into the accounts
        let mut withdrawn = vec![Cents::ZERO; n];
        for idx in 0..n {
            let amount = withdrawals.per_account[idx];
            if !amount.is_positive() {
                continue;
            }
            let account = &mut state.accounts[idx];
            let mut modification = BalanceModification::new(idx, -amount, "withdrawal");
            match account.tax_character {
                TaxCharacter::Taxable => {
                    modification.cost_basis_override = account.cost_basis.map(|basis| {
                        let (_, used) = capital_gain_on_withdrawal(amount, account.balance, basis);
                        basis - used
                    });
                }
                TaxCharacter::TaxFree => {
                    let from_contributions = amount.min(account.contribution_basis);
                    account.contribution_basis -= from_contributions;
                    consume_seasoned_conversions(
                        &mut lots,
                        idx,
                        year_offset,
                        amount - from_contributions,
                    );
                }
                TaxCharacter::TaxDeferred | TaxCharacter::TaxDeductible => {}
            }
            if let Ok(applied) = state.apply_modification(&modification) {
                withdrawn[idx] = -applied.delta;
            }
        }

        // RMD dollars beyond the need are reinvested in the first taxable account
        let excess = (withdrawals.total - deficit).non_negative();
        if excess.is_positive() && withdrawals.mandatory.is_positive() {
            let target = state
                .find_account(|a| a.tax_character == TaxCharacter::Taxable && a.is_withdrawable());
            if let Some(idx) = target {
                let basis = state.accounts[idx].cost_basis.map(|b| b + excess);
                let mut deposit = BalanceModification::new(idx, excess, "excess rmd reinvested");
                deposit.cost_basis_override = basis;
                if state.apply_modification(&deposit).is_ok() {
                    contributions[idx] += excess;
                }
            }
        }

        carryforward = tax.remaining_carryforward;
        state.totals.taxes_paid = tax.impact.total;

        // (10) emit the row
        let ending_balance = state.withdrawable_balance();
        let depleted = need.is_positive() && !ending_balance.is_positive();
        if depleted {
            phase = ProjectionPhase::Depleted;
            depleted_at = Some(year_offset);
        }

        let account_rows = state
            .accounts
            .iter()
            .enumerate()
            .map(|(idx, a)| AccountYear {
                account_id: a.account_id,
                name: a.name.clone(),
                kind: a.kind,
                starting_balance: starting[idx],
                growth: growth[idx],
                contributions: contributions[idx],
                rule_adjustments: rule_adjustments[idx],
                withdrawals: withdrawn[idx],
                ending_balance: a.balance,
                cost_basis: a.cost_basis,
            })
            .collect();

        rows.push(SimulationResult {
            year_offset,
            year: state.meta.calendar_year,
            age,
            phase,
            starting_balance,
            growth: withdrawable_sum(&growth, &state.accounts),
            contributions: withdrawable_sum(&contributions, &state.accounts),
            income: income.gross(),
            social_security: state.totals.social_security,
            spending,
            withdrawals: withdrawals.total,
            rmd_required: state.totals.rmd_required,
            shortfall,
            tax: tax.impact,
            ending_balance,
            net_worth: state.net_worth(),
            inflation_factor,
            real_ending_balance: ending_balance.scale(1.0 / inflation_factor),
            real_spending: spending.scale(1.0 / inflation_factor),
            accounts: account_rows,
        });
        rule_reports.push(report);

        if depleted {
            tracing::debug!(year_offset, age, "plan depleted");
            break;
        }

        inflation_factor *= 1.0 + plan.assumptions.inflation_rate;
        accounts = state.accounts;
    }

    tracing::trace!(years_emitted = rows.len(), final_phase = ?phase, "projection run");

    ProjectionOutcome {
        years: rows,
        rule_reports,
        final_phase: phase,
        depleted_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccountBuilder, PlanBuilder};

    fn d(dollars: i64) -> Cents {
        Cents::from_dollars(dollars)
    }

    #[test]
    fn test_single_account_growth() {
        let plan = PlanBuilder::new()
            .ages(40, 65)
            .account(
                AccountBuilder::taxable_brokerage("Brokerage")
                    .balance_cents(100_000)
                    .growth_rate(0.07),
            )
            .build();
        let outcome = run_projection(&plan, 1).unwrap();
        let year = &outcome.years[0];
        assert_eq!(year.growth, Cents(7_000));
        assert_eq!(year.ending_balance, Cents(107_000));
        assert_eq!(year.withdrawals, Cents::ZERO);
    }

    #[test]
    fn test_contributions_capped_by_limit() {
        let plan = PlanBuilder::new()
            .ages(40, 65)
            .account(
                AccountBuilder::traditional_401k("401k")
                    .balance(0)
                    .growth_rate(0.0)
                    .contribution(50_000),
            )
            .build();
        let outcome = run_projection(&plan, 1).unwrap();
        assert_eq!(outcome.years[0].contributions, d(23_000));
    }

    #[test]
    fn test_debt_accrues_interest_and_is_paid_down() {
        let plan = PlanBuilder::new()
            .ages(40, 65)
            .account(AccountBuilder::loan("Mortgage", 100_000, 0.05).contribution(10_000))
            .account(
                AccountBuilder::taxable_brokerage("Brokerage")
                    .balance(500_000)
                    .growth_rate(0.0),
            )
            .build();
        let outcome = run_projection(&plan, 1).unwrap();
        let mortgage = &outcome.years[0].accounts[0];
        assert_eq!(mortgage.growth, d(5_000));
        assert_eq!(mortgage.ending_balance, d(95_000));
        // the payment is funded from the brokerage
        assert_eq!(outcome.years[0].spending, d(10_000));
        assert_eq!(outcome.years[0].withdrawals, d(10_000));
    }

    #[test]
    fn test_depletion_stops_projection() {
        let plan = PlanBuilder::new()
            .ages(70, 65)
            .account(AccountBuilder::roth_ira("Roth").balance(100_000).growth_rate(0.0))
            .retirement_spending(40_000)
            .inflation(0.0)
            .build();
        let outcome = run_projection(&plan, 10).unwrap();
        assert_eq!(outcome.years.len(), 3);
        assert_eq!(outcome.final_phase, ProjectionPhase::Depleted);
        assert_eq!(outcome.depleted_at, Some(2));
        let last = outcome.years.last().unwrap();
        assert_eq!(last.ending_balance, Cents::ZERO);
        assert_eq!(last.shortfall, d(20_000));
    }

    #[test]
    fn test_rmd_withdrawn_even_without_spending() {
        let plan = PlanBuilder::new()
            .ages(75, 65)
            .account(
                AccountBuilder::traditional_ira("IRA")
                    .balance(246_000)
                    .growth_rate(0.0),
            )
            .account(
                AccountBuilder::taxable_brokerage("Brokerage")
                    .balance(0)
                    .cost_basis(0),
            )
            .build();
        let outcome = run_projection(&plan, 1).unwrap();
        let year = &outcome.years[0];
        // 246,000 / 24.6
        assert_eq!(year.rmd_required, d(10_000));
        assert_eq!(year.accounts[0].withdrawals, d(10_000));
        assert!(year.tax.total.is_positive());
        // net of tax, the rest of the RMD lands in the brokerage
        assert_eq!(
            year.accounts[1].ending_balance,
            d(10_000) - year.tax.total
        );
    }

    #[test]
    fn test_tax_is_grossed_up() {
        let plan = PlanBuilder::new()
            .ages(60, 60)
            .account(
                AccountBuilder::traditional_ira("IRA")
                    .balance(1_000_000)
                    .growth_rate(0.0),
            )
            .retirement_spending(60_000)
            .inflation(0.0)
            .build();
        let outcome = run_projection(&plan, 1).unwrap();
        let year = &outcome.years[0];
        let net = year.withdrawals - year.tax.total;
        assert!(
            (net - d(60_000)).0.abs() < 200,
            "net of tax {net} should cover spending"
        );
        assert!(year.shortfall < d(2));
    }
}
