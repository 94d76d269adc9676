//! Account definitions
//!
//! Accounts carry an integer balance, an optional cost basis and a tax
//! characteristic. The engine never mutates a plan's accounts directly: each
//! year works on a cloned snapshot which is only changed through
//! [`BalanceModification`](super::BalanceModification) records.

use serde::{Deserialize, Serialize};

use super::ids::AccountId;
use super::money::Cents;

/// Closed set of account kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountKind {
    /// Employer 401(k)
    #[serde(rename = "401k")]
    Traditional401k,
    /// Traditional IRA
    #[serde(rename = "ira")]
    TraditionalIra,
    /// Roth IRA or Roth 401(k)
    #[serde(rename = "roth")]
    Roth,
    /// Health Savings Account
    #[serde(rename = "hsa")]
    Hsa,
    /// Regular brokerage account
    #[serde(rename = "taxable")]
    Taxable,
    /// Real estate, vehicles and other appreciating property
    #[serde(rename = "real_asset")]
    RealAsset,
    /// Mortgages and loans, balance is the amount owed
    #[serde(rename = "debt")]
    Debt,
    /// Other tax-advantaged savings (529, pension pots)
    #[serde(rename = "tax_advantaged")]
    TaxAdvantaged,
}

/// Tax treatment for an account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaxCharacter {
    /// Regular brokerage - capital gains taxed
    Taxable,
    /// 401k, Traditional IRA - contributions tax-deferred, withdrawals taxed as income
    TaxDeferred,
    /// Roth IRA, Roth 401k - contributions post-tax, withdrawals tax-free
    TaxFree,
    /// HSA - contributions deductible, qualified withdrawals tax-free
    TaxDeductible,
}

impl AccountKind {
    /// Tax characteristic an account of this kind gets unless overridden
    #[must_use]
    pub fn default_tax_character(self) -> TaxCharacter {
        match self {
            AccountKind::Traditional401k | AccountKind::TraditionalIra => TaxCharacter::TaxDeferred,
            AccountKind::TaxAdvantaged => TaxCharacter::TaxDeferred,
            AccountKind::Roth => TaxCharacter::TaxFree,
            AccountKind::Hsa => TaxCharacter::TaxDeductible,
            AccountKind::Taxable | AccountKind::RealAsset | AccountKind::Debt => {
                TaxCharacter::Taxable
            }
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AccountKind::Traditional401k => "401k",
            AccountKind::TraditionalIra => "ira",
            AccountKind::Roth => "roth",
            AccountKind::Hsa => "hsa",
            AccountKind::Taxable => "taxable",
            AccountKind::RealAsset => "real_asset",
            AccountKind::Debt => "debt",
            AccountKind::TaxAdvantaged => "tax_advantaged",
        }
    }
}

/// A single account in the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    pub balance: Cents,
    /// Tracked cost basis, only meaningful for taxable accounts
    #[serde(default)]
    pub cost_basis: Option<Cents>,
    /// Growth, appreciation or interest rate overriding the plan default
    #[serde(default)]
    pub growth_rate: Option<f64>,
    pub tax_character: TaxCharacter,
    /// Scheduled yearly contribution while working (loan payment for debts)
    #[serde(default)]
    pub annual_contribution: Cents,
    /// Direct Roth contributions, always withdrawable without penalty
    #[serde(default)]
    pub contribution_basis: Cents,
}

impl Account {
    /// Accounts the withdrawal strategies may draw from
    #[must_use]
    pub fn is_withdrawable(&self) -> bool {
        !matches!(self.kind, AccountKind::RealAsset | AccountKind::Debt)
    }

    /// Traditional 401(k)/IRA holding pre-tax dollars
    #[must_use]
    pub fn is_traditional(&self) -> bool {
        matches!(
            self.kind,
            AccountKind::Traditional401k | AccountKind::TraditionalIra
        ) && self.tax_character == TaxCharacter::TaxDeferred
    }

    /// Traditional IRAs are the only accounts counted by the pro-rata rule
    #[must_use]
    pub fn is_traditional_ira(&self) -> bool {
        self.kind == AccountKind::TraditionalIra && self.tax_character == TaxCharacter::TaxDeferred
    }

    #[must_use]
    pub fn is_roth(&self) -> bool {
        self.kind == AccountKind::Roth
    }

    /// Subject to required minimum distributions
    #[must_use]
    pub fn is_rmd_eligible(&self) -> bool {
        self.is_withdrawable() && self.tax_character == TaxCharacter::TaxDeferred
    }

    /// Taxable brokerage account with a tracked cost basis
    #[must_use]
    pub fn has_tracked_basis(&self) -> bool {
        self.tax_character == TaxCharacter::Taxable
            && self.is_withdrawable()
            && self.cost_basis.is_some()
    }

    #[must_use]
    pub fn is_debt(&self) -> bool {
        self.kind == AccountKind::Debt
    }

    /// Unrealized loss against the tracked basis, zero when in a gain or untracked
    #[must_use]
    pub fn unrealized_loss(&self) -> Cents {
        match self.cost_basis {
            Some(basis) => (basis - self.balance).non_negative(),
            None => Cents::ZERO,
        }
    }
}
