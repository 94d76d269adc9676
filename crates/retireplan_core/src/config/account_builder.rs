//! Account Builder DSL
//!
//! Preset constructors for the account kinds a plan usually holds. Amounts
//! are whole dollars unless the method name says otherwise.
//!
//! ```ignore
//! use retireplan_core::config::AccountBuilder;
//!
//! let ira = AccountBuilder::traditional_ira("Rollover IRA")
//!     .balance(350_000)
//!     .growth_rate(0.06);
//!
//! let brokerage = AccountBuilder::taxable_brokerage("Brokerage")
//!     .balance(120_000)
//!     .cost_basis(90_000);
//! ```

use crate::model::{Account, AccountId, AccountKind, Cents, TaxCharacter};

/// Builder for creating accounts with a fluent API
#[derive(Debug, Clone)]
pub struct AccountBuilder {
    pub(crate) name: String,
    kind: AccountKind,
    balance: Cents,
    cost_basis: Option<Cents>,
    growth_rate: Option<f64>,
    tax_character: Option<TaxCharacter>,
    annual_contribution: Cents,
    contribution_basis: Cents,
}

impl AccountBuilder {
    fn preset(name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            name: name.into(),
            kind,
            balance: Cents::ZERO,
            cost_basis: None,
            growth_rate: None,
            tax_character: None,
            annual_contribution: Cents::ZERO,
            contribution_basis: Cents::ZERO,
        }
    }

    // =========================================================================
    // Preset Account Type Constructors
    // =========================================================================

    /// Traditional 401(k): pre-tax deferrals, withdrawals taxed as ordinary income
    #[must_use]
    pub fn traditional_401k(name: impl Into<String>) -> Self {
        Self::preset(name, AccountKind::Traditional401k)
    }

    /// Traditional IRA: counted by the pro-rata rule on backdoor conversions
    #[must_use]
    pub fn traditional_ira(name: impl Into<String>) -> Self {
        Self::preset(name, AccountKind::TraditionalIra)
    }

    /// Roth IRA: qualified withdrawals tax-free
    #[must_use]
    pub fn roth_ira(name: impl Into<String>) -> Self {
        Self::preset(name, AccountKind::Roth)
    }

    /// Health savings account: deductible contributions, qualified withdrawals tax-free
    #[must_use]
    pub fn hsa(name: impl Into<String>) -> Self {
        Self::preset(name, AccountKind::Hsa)
    }

    /// Taxable brokerage. The cost basis is tracked and defaults to the balance.
    #[must_use]
    pub fn taxable_brokerage(name: impl Into<String>) -> Self {
        Self::preset(name, AccountKind::Taxable)
    }

    /// Real estate or another appreciating asset; never withdrawn from
    #[must_use]
    pub fn real_estate(name: impl Into<String>, value: i64) -> Self {
        Self::preset(name, AccountKind::RealAsset).balance(value)
    }

    /// Loan accruing interest at `rate`, paid down by its contribution
    #[must_use]
    pub fn loan(name: impl Into<String>, principal: i64, rate: f64) -> Self {
        Self::preset(name, AccountKind::Debt)
            .balance(principal)
            .growth_rate(rate)
    }

    // =========================================================================
    // Fields
    // =========================================================================

    #[must_use]
    pub fn balance(self, dollars: i64) -> Self {
        self.balance_cents(Cents::from_dollars(dollars).0)
    }

    #[must_use]
    pub fn balance_cents(mut self, cents: i64) -> Self {
        self.balance = Cents(cents);
        self
    }

    #[must_use]
    pub fn cost_basis(mut self, dollars: i64) -> Self {
        self.cost_basis = Some(Cents::from_dollars(dollars));
        self
    }

    /// Growth, appreciation or interest rate overriding the plan default
    #[must_use]
    pub fn growth_rate(mut self, rate: f64) -> Self {
        self.growth_rate = Some(rate);
        self
    }

    /// Yearly contribution while working (loan payment for debts)
    #[must_use]
    pub fn contribution(mut self, dollars: i64) -> Self {
        self.annual_contribution = Cents::from_dollars(dollars);
        self
    }

    /// Direct Roth contributions already in the account
    #[must_use]
    pub fn contribution_basis(mut self, dollars: i64) -> Self {
        self.contribution_basis = Cents::from_dollars(dollars);
        self
    }

    #[must_use]
    pub fn tax_character(mut self, character: TaxCharacter) -> Self {
        self.tax_character = Some(character);
        self
    }

    #[must_use]
    pub fn build(self, account_id: AccountId) -> Account {
        let cost_basis = match self.kind {
            AccountKind::Taxable => Some(self.cost_basis.unwrap_or(self.balance)),
            _ => self.cost_basis,
        };
        Account {
            account_id,
            name: self.name,
            kind: self.kind,
            balance: self.balance,
            cost_basis,
            growth_rate: self.growth_rate,
            tax_character: self
                .tax_character
                .unwrap_or_else(|| self.kind.default_tax_character()),
            annual_contribution: self.annual_contribution,
            contribution_basis: self.contribution_basis,
        }
    }
}
