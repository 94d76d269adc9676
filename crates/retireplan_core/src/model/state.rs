//! Per-year working state
//!
//! A `ProjectionState` is built fresh for every projected year from the prior
//! year's ending accounts. Account balances are copied by value, so no two
//! years ever alias each other's snapshot.

use serde::{Deserialize, Serialize};

use super::accounts::Account;
use super::money::Cents;
use super::results::BalanceModification;
use crate::error::RuleError;

/// Where the projection is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionPhase {
    Accumulating,
    Retired,
    /// Terminal: liquid assets ran out while a withdrawal was needed
    Depleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearMetadata {
    pub year_offset: u32,
    pub calendar_year: i16,
    pub age: u32,
    pub is_retired: bool,
}

/// Running tax-relevant totals for the year being projected
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningTotals {
    /// Earned income (FICA base)
    pub wages: Cents,
    /// Ordinary income before deductions, wages included
    pub ordinary_income: Cents,
    /// Realized long-term gains
    pub capital_gains: Cents,
    /// Losses realized this year
    pub capital_losses: Cents,
    /// Unused losses from earlier years
    pub loss_carryforward: Cents,
    /// Gross Social Security benefit received
    pub social_security: Cents,
    /// Pre-tax contributions deducted from ordinary income
    pub pre_tax_contributions: Cents,
    /// Total required minimum distribution for the year
    pub rmd_required: Cents,
    /// Portion of the RMD already satisfied (by QCDs)
    pub rmd_satisfied: Cents,
    /// Tax cost estimated by rule actions
    pub rule_tax_cost: Cents,
    pub taxes_paid: Cents,
}

impl RunningTotals {
    /// RMD still to be withdrawn
    #[must_use]
    pub fn rmd_outstanding(&self) -> Cents {
        (self.rmd_required - self.rmd_satisfied).non_negative()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionState {
    pub meta: YearMetadata,
    pub accounts: Vec<Account>,
    /// Required distribution per account, parallel to `accounts`
    pub rmd_by_account: Vec<Cents>,
    pub totals: RunningTotals,
}

impl ProjectionState {
    #[must_use]
    pub fn new(meta: YearMetadata, accounts: Vec<Account>) -> Self {
        let rmd_by_account = vec![Cents::ZERO; accounts.len()];
        Self {
            meta,
            accounts,
            rmd_by_account,
            totals: RunningTotals::default(),
        }
    }

    pub fn account(&self, index: usize) -> Result<&Account, RuleError> {
        self.accounts
            .get(index)
            .ok_or(RuleError::AccountOutOfRange(index))
    }

    /// Index of the first account matching a predicate
    pub fn find_account(&self, predicate: impl Fn(&Account) -> bool) -> Option<usize> {
        self.accounts.iter().position(predicate)
    }

    /// Sum of balances over accounts matching a predicate
    pub fn balance_where(&self, predicate: impl Fn(&Account) -> bool) -> Cents {
        self.accounts
            .iter()
            .filter(|&a| predicate(a))
            .map(|a| a.balance)
            .sum()
    }

    /// Total of all accounts the withdrawal strategies may draw from
    #[must_use]
    pub fn withdrawable_balance(&self) -> Cents {
        self.balance_where(Account::is_withdrawable)
    }

    /// Withdrawable + real assets - debt
    #[must_use]
    pub fn net_worth(&self) -> Cents {
        self.accounts
            .iter()
            .map(|a| if a.is_debt() { -a.balance } else { a.balance })
            .sum()
    }

    /// Unsatisfied RMD for one account.
    ///
    /// Satisfied amounts (QCDs) reduce every account's share proportionally.
    #[must_use]
    pub fn rmd_outstanding_for(&self, index: usize) -> Cents {
        let required = self.rmd_by_account.get(index).copied().unwrap_or(Cents::ZERO);
        required.pro_rata(self.totals.rmd_outstanding(), self.totals.rmd_required)
    }

    /// Apply one modification, clamping so the balance never drops below zero.
    ///
    /// Returns the modification actually applied, with a truncated delta when
    /// the account could not cover the full debit.
    pub fn apply_modification(
        &mut self,
        modification: &BalanceModification,
    ) -> Result<BalanceModification, RuleError> {
        let account = self
            .accounts
            .get_mut(modification.account_index)
            .ok_or(RuleError::AccountOutOfRange(modification.account_index))?;

        let mut applied = modification.clone();
        if account.balance + modification.delta < Cents::ZERO {
            applied.delta = -account.balance;
        }
        account.balance += applied.delta;
        if let Some(basis) = modification.cost_basis_override {
            account.cost_basis = Some(basis.non_negative());
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountId, AccountKind};

    fn state_with_balance(balance: i64) -> ProjectionState {
        ProjectionState::new(
            YearMetadata {
                year_offset: 0,
                calendar_year: 2025,
                age: 60,
                is_retired: true,
            },
            vec![Account {
                account_id: AccountId(0),
                name: "IRA".into(),
                kind: AccountKind::TraditionalIra,
                balance: Cents(balance),
                cost_basis: None,
                growth_rate: None,
                tax_character: AccountKind::TraditionalIra.default_tax_character(),
                annual_contribution: Cents::ZERO,
                contribution_basis: Cents::ZERO,
            }],
        )
    }

    #[test]
    fn test_modification_is_truncated_at_zero() {
        let mut state = state_with_balance(500);
        let applied = state
            .apply_modification(&BalanceModification::new(0, Cents(-800), "withdrawal"))
            .unwrap();
        assert_eq!(applied.delta, Cents(-500));
        assert_eq!(state.accounts[0].balance, Cents::ZERO);

        // Already depleted: nothing more comes out
        let applied = state
            .apply_modification(&BalanceModification::new(0, Cents(-100), "withdrawal"))
            .unwrap();
        assert_eq!(applied.delta, Cents::ZERO);
    }

    #[test]
    fn test_out_of_range_modification_is_an_error() {
        let mut state = state_with_balance(500);
        let result = state.apply_modification(&BalanceModification::new(3, Cents(1), "x"));
        assert_eq!(result, Err(RuleError::AccountOutOfRange(3)));
    }
}
