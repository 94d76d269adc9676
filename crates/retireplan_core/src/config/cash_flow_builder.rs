//! Income and expense builders
//!
//! Incomes are inflation-adjusted only when asked to be; expenses are
//! inflation-adjusted unless marked `fixed()`.

use crate::model::{Cents, Expense, ExpenseId, Income, IncomeId, IncomeKind};

#[derive(Debug, Clone)]
pub struct IncomeBuilder {
    name: String,
    kind: IncomeKind,
    annual_amount: Cents,
    start_age: Option<u32>,
    end_age: Option<u32>,
    inflation_adjusted: bool,
}

impl IncomeBuilder {
    fn of_kind(name: impl Into<String>, kind: IncomeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annual_amount: Cents::ZERO,
            start_age: None,
            end_age: None,
            inflation_adjusted: false,
        }
    }

    /// Earned income, subject to FICA
    #[must_use]
    pub fn wages(name: impl Into<String>) -> Self {
        Self::of_kind(name, IncomeKind::Wages)
    }

    #[must_use]
    pub fn pension(name: impl Into<String>) -> Self {
        Self::of_kind(name, IncomeKind::Pension)
    }

    /// Realized gains or qualified dividends outside the modeled accounts
    #[must_use]
    pub fn capital_gains(name: impl Into<String>) -> Self {
        Self::of_kind(name, IncomeKind::CapitalGains)
    }

    #[must_use]
    pub fn tax_free(name: impl Into<String>) -> Self {
        Self::of_kind(name, IncomeKind::TaxFree)
    }

    #[must_use]
    pub fn amount(mut self, dollars: i64) -> Self {
        self.annual_amount = Cents::from_dollars(dollars);
        self
    }

    #[must_use]
    pub fn from_age(mut self, age: u32) -> Self {
        self.start_age = Some(age);
        self
    }

    /// Last age (inclusive) the income is received
    #[must_use]
    pub fn until_age(mut self, age: u32) -> Self {
        self.end_age = Some(age);
        self
    }

    #[must_use]
    pub fn inflation_adjusted(mut self) -> Self {
        self.inflation_adjusted = true;
        self
    }

    #[must_use]
    pub fn build(self, income_id: IncomeId) -> Income {
        Income {
            income_id,
            name: self.name,
            kind: self.kind,
            annual_amount: self.annual_amount,
            start_age: self.start_age,
            end_age: self.end_age,
            inflation_adjusted: self.inflation_adjusted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpenseBuilder {
    name: String,
    annual_amount: Cents,
    start_age: Option<u32>,
    end_age: Option<u32>,
    inflation_adjusted: bool,
}

impl ExpenseBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annual_amount: Cents::ZERO,
            start_age: None,
            end_age: None,
            inflation_adjusted: true,
        }
    }

    #[must_use]
    pub fn amount(mut self, dollars: i64) -> Self {
        self.annual_amount = Cents::from_dollars(dollars);
        self
    }

    #[must_use]
    pub fn from_age(mut self, age: u32) -> Self {
        self.start_age = Some(age);
        self
    }

    #[must_use]
    pub fn until_age(mut self, age: u32) -> Self {
        self.end_age = Some(age);
        self
    }

    /// Keep the nominal amount constant
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.inflation_adjusted = false;
        self
    }

    #[must_use]
    pub fn build(self, expense_id: ExpenseId) -> Expense {
        Expense {
            expense_id,
            name: self.name,
            annual_amount: self.annual_amount,
            start_age: self.start_age,
            end_age: self.end_age,
            inflation_adjusted: self.inflation_adjusted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pension_window() {
        let pension = IncomeBuilder::pension("Pension")
            .amount(24_000)
            .from_age(65)
            .inflation_adjusted()
            .build(IncomeId(3));
        assert_eq!(pension.kind, IncomeKind::Pension);
        assert_eq!(pension.income_id, IncomeId(3));
        assert_eq!(pension.annual_amount, Cents::from_dollars(24_000));
        assert!(pension.inflation_adjusted);
        assert!(!pension.is_active(64));
        assert!(pension.is_active(90));
    }

    #[test]
    fn test_expense_window_and_fixed() {
        let tuition = ExpenseBuilder::new("Tuition")
            .amount(30_000)
            .from_age(50)
            .until_age(53)
            .fixed()
            .build(ExpenseId(0));
        assert!(!tuition.inflation_adjusted);
        assert!(!tuition.is_active(49));
        assert!(tuition.is_active(53));
        assert!(!tuition.is_active(54));
    }
}
