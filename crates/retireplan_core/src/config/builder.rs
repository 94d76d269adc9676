//! Plan Builder
//!
//! Fluent construction of a [`Plan`] with automatic ID assignment.
//!
//! ```ignore
//! use retireplan_core::config::{AccountBuilder, IncomeBuilder, PlanBuilder};
//!
//! let plan = PlanBuilder::new()
//!     .ages(45, 62)
//!     .birth_year(1980)
//!     .start_year(2025)
//!     .account(AccountBuilder::traditional_401k("Work 401k").balance(400_000).contribution(23_000))
//!     .account(AccountBuilder::roth_ira("Roth").balance(60_000))
//!     .income(IncomeBuilder::wages("Salary").amount(150_000).until_age(61))
//!     .retirement_spending(80_000)
//!     .social_security(67, 32_000)
//!     .build();
//! ```

use crate::model::{
    AccountId, Cents, ExpenseId, FilingStatus, IncomeId, Plan, StrategySettings, TaxProfile,
    WithdrawalStrategy,
};

use super::account_builder::AccountBuilder;
use super::cash_flow_builder::{ExpenseBuilder, IncomeBuilder};

/// Builder for plans; accounts, incomes and expenses keep insertion order
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    plan: Plan,
    pending_accounts: Vec<AccountBuilder>,
    pending_incomes: Vec<IncomeBuilder>,
    pending_expenses: Vec<ExpenseBuilder>,
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            plan: Plan::default(),
            pending_accounts: Vec::new(),
            pending_incomes: Vec::new(),
            pending_expenses: Vec::new(),
        }
    }

    // =========================================================================
    // Person
    // =========================================================================

    #[must_use]
    pub fn ages(mut self, current_age: u32, retirement_age: u32) -> Self {
        self.plan.current_age = current_age;
        self.plan.retirement_age = retirement_age;
        self
    }

    /// Drives the RMD start age
    #[must_use]
    pub fn birth_year(mut self, year: i16) -> Self {
        self.plan.birth_year = Some(year);
        self
    }

    /// First calendar year of the projection (January 1st)
    #[must_use]
    pub fn start_year(mut self, year: i16) -> Self {
        self.plan.start_date = jiff::civil::date(year, 1, 1);
        self
    }

    // =========================================================================
    // Accounts and cash flows
    // =========================================================================

    #[must_use]
    pub fn account(mut self, account: AccountBuilder) -> Self {
        self.pending_accounts.push(account);
        self
    }

    #[must_use]
    pub fn income(mut self, income: IncomeBuilder) -> Self {
        self.pending_incomes.push(income);
        self
    }

    #[must_use]
    pub fn expense(mut self, expense: ExpenseBuilder) -> Self {
        self.pending_expenses.push(expense);
        self
    }

    /// Yearly spending target once retired, in today's dollars
    #[must_use]
    pub fn retirement_spending(mut self, dollars: i64) -> Self {
        self.plan.retirement_spending = Cents::from_dollars(dollars);
        self
    }

    /// Enable an inflation-adjusted Social Security benefit from `start_age`
    #[must_use]
    pub fn social_security(mut self, start_age: u32, annual_benefit: i64) -> Self {
        let ss = &mut self.plan.social_security;
        ss.enabled = true;
        ss.start_age = start_age;
        ss.annual_benefit = Cents::from_dollars(annual_benefit);
        self
    }

    // =========================================================================
    // Taxes and assumptions
    // =========================================================================

    /// 2024 tables for a filing status and state postal code
    #[must_use]
    pub fn filing(mut self, status: FilingStatus, state_code: &str) -> Self {
        self.plan.tax_profile = TaxProfile::for_filing_status(status, state_code);
        self
    }

    #[must_use]
    pub fn tax_profile(mut self, profile: TaxProfile) -> Self {
        self.plan.tax_profile = profile;
        self
    }

    /// Default growth rate for accounts without their own
    #[must_use]
    pub fn growth(mut self, rate: f64) -> Self {
        self.plan.assumptions.default_growth_rate = rate;
        self
    }

    #[must_use]
    pub fn inflation(mut self, rate: f64) -> Self {
        self.plan.assumptions.inflation_rate = rate;
        self
    }

    #[must_use]
    pub fn withdrawal_strategy(mut self, strategy: WithdrawalStrategy) -> Self {
        self.plan.assumptions.withdrawal_strategy = strategy;
        self
    }

    #[must_use]
    pub fn rmd_start_age(mut self, age: u32) -> Self {
        self.plan.assumptions.rmd_start_age = Some(age);
        self
    }

    #[must_use]
    pub fn strategies(mut self, strategies: StrategySettings) -> Self {
        self.plan.strategies = strategies;
        self
    }

    /// Build the plan, numbering accounts, incomes and expenses from zero
    #[must_use]
    pub fn build(self) -> Plan {
        let mut plan = self.plan;
        plan.accounts = self
            .pending_accounts
            .into_iter()
            .enumerate()
            .map(|(i, b)| b.build(AccountId(i as u16)))
            .collect();
        plan.incomes = self
            .pending_incomes
            .into_iter()
            .enumerate()
            .map(|(i, b)| b.build(IncomeId(i as u16)))
            .collect();
        plan.expenses = self
            .pending_expenses
            .into_iter()
            .enumerate()
            .map(|(i, b)| b.build(ExpenseId(i as u16)))
            .collect();
        plan
    }
}
