//! The financial plan handed to the engine
//!
//! A `Plan` is built once per request (by the builder DSL or by deserializing
//! JSON) and is treated as immutable input. Numeric fields are assumed to be
//! validated already; the engine does not re-check them.

use serde::{Deserialize, Serialize};

use super::accounts::Account;
use super::ids::{AccountId, ExpenseId, IncomeId};
use super::limits::ContributionLimits;
use super::money::Cents;
use super::rmd::{RmdTable, rmd_start_age_for_birth_year};
use super::strategies::StrategySettings;
use super::tax_config::TaxProfile;

/// How a residual funding need is spread across accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStrategy {
    /// Split in proportion to account balances
    Proportional,
    /// Tax-free first, then taxable, tax-deferred last
    #[default]
    TaxEfficient,
    /// Like tax-efficient, but always exhausts taxable accounts first
    TaxAware,
}

/// Tax treatment of an income stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeKind {
    /// Earned income, subject to FICA
    #[default]
    Wages,
    /// Pensions and annuities, ordinary income without FICA
    Pension,
    /// Realized long-term gains outside the modeled accounts
    CapitalGains,
    /// Gifts, inheritances and other untaxed receipts
    TaxFree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub income_id: IncomeId,
    pub name: String,
    #[serde(default)]
    pub kind: IncomeKind,
    pub annual_amount: Cents,
    #[serde(default)]
    pub start_age: Option<u32>,
    /// Last age (inclusive) the income is received
    #[serde(default)]
    pub end_age: Option<u32>,
    #[serde(default)]
    pub inflation_adjusted: bool,
}

impl Income {
    #[must_use]
    pub fn is_active(&self, age: u32) -> bool {
        self.start_age.is_none_or(|s| age >= s) && self.end_age.is_none_or(|e| age <= e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: ExpenseId,
    pub name: String,
    pub annual_amount: Cents,
    #[serde(default)]
    pub start_age: Option<u32>,
    /// Last age (inclusive) the expense is paid
    #[serde(default)]
    pub end_age: Option<u32>,
    #[serde(default = "default_true")]
    pub inflation_adjusted: bool,
}

impl Expense {
    #[must_use]
    pub fn is_active(&self, age: u32) -> bool {
        self.start_age.is_none_or(|s| age >= s) && self.end_age.is_none_or(|e| age <= e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialSecurity {
    pub enabled: bool,
    pub start_age: u32,
    /// Benefit in today's dollars
    pub annual_benefit: Cents,
    pub inflation_adjusted: bool,
}

impl Default for SocialSecurity {
    fn default() -> Self {
        Self {
            enabled: false,
            start_age: 67,
            annual_benefit: Cents::ZERO,
            inflation_adjusted: true,
        }
    }
}

/// Economic assumptions and engine switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumptions {
    /// Growth rate for accounts without an override
    pub default_growth_rate: f64,
    pub inflation_rate: f64,
    /// Grow the real spending target with inflation
    pub inflate_spending: bool,
    pub withdrawal_strategy: WithdrawalStrategy,
    /// Overrides the birth-year derived RMD start age
    pub rmd_start_age: Option<u32>,
    pub rmd_table: RmdTable,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            default_growth_rate: 0.07,
            inflation_rate: 0.03,
            inflate_spending: true,
            withdrawal_strategy: WithdrawalStrategy::default(),
            rmd_start_age: None,
            rmd_table: RmdTable::default(),
        }
    }
}

/// Calendar year used when a plan does not name one; matches the tax tables
pub const DEFAULT_START_YEAR: i16 = 2024;

fn default_start_date() -> jiff::civil::Date {
    jiff::civil::date(DEFAULT_START_YEAR, 1, 1)
}

fn default_true() -> bool {
    true
}

/// Complete plan description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub current_age: u32,
    pub retirement_age: u32,
    /// Used for the SECURE 2.0 RMD start age
    #[serde(default)]
    pub birth_year: Option<i16>,
    /// First day of the projection
    #[serde(default = "default_start_date")]
    pub start_date: jiff::civil::Date,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub incomes: Vec<Income>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    /// Yearly spending target once retired, in today's dollars
    #[serde(default)]
    pub retirement_spending: Cents,
    #[serde(default)]
    pub social_security: SocialSecurity,
    #[serde(default)]
    pub tax_profile: TaxProfile,
    #[serde(default)]
    pub limits: ContributionLimits,
    #[serde(default)]
    pub assumptions: Assumptions,
    #[serde(default)]
    pub strategies: StrategySettings,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            current_age: 40,
            retirement_age: 65,
            birth_year: None,
            start_date: default_start_date(),
            accounts: Vec::new(),
            incomes: Vec::new(),
            expenses: Vec::new(),
            retirement_spending: Cents::ZERO,
            social_security: SocialSecurity::default(),
            tax_profile: TaxProfile::default(),
            limits: ContributionLimits::default(),
            assumptions: Assumptions::default(),
            strategies: StrategySettings::default(),
        }
    }
}

impl Plan {
    #[must_use]
    pub fn age_at(&self, year_offset: u32) -> u32 {
        self.current_age + year_offset
    }

    #[must_use]
    pub fn is_retired_at(&self, year_offset: u32) -> bool {
        self.age_at(year_offset) >= self.retirement_age
    }

    /// Calendar year for a projection offset
    #[must_use]
    pub fn calendar_year(&self, year_offset: u32) -> i16 {
        self.start_date.year().saturating_add(year_offset as i16)
    }

    /// Age at which RMDs begin
    #[must_use]
    pub fn rmd_start_age(&self) -> u32 {
        if let Some(age) = self.assumptions.rmd_start_age {
            return age;
        }
        match self.birth_year {
            Some(year) => rmd_start_age_for_birth_year(year),
            None => 73,
        }
    }

    #[must_use]
    pub fn account_index(&self, account_id: AccountId) -> Option<usize> {
        self.accounts
            .iter()
            .position(|a| a.account_id == account_id)
    }
}
