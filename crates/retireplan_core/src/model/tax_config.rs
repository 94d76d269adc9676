//! Tax configuration types
//!
//! Defines bracket tables and per-jurisdiction settings. The bracket-walking
//! logic itself is in the `taxes` module.

use serde::{Deserialize, Serialize};

use super::money::Cents;

/// A single bracket in a progressive tax table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Taxable amount where this bracket begins
    pub min: Cents,
    /// Where it ends, `None` for the top bracket
    pub max: Option<Cents>,
    /// Rate for income falling in this bracket (e.g., 0.22 for 22%)
    pub rate: f64,
}

/// Build an ordered, non-overlapping table from `(start in dollars, rate)` pairs
#[must_use]
pub fn bracket_table(starts: &[(i64, f64)]) -> Vec<TaxBracket> {
    starts
        .iter()
        .enumerate()
        .map(|(i, &(min, rate))| TaxBracket {
            min: Cents::from_dollars(min),
            max: starts.get(i + 1).map(|&(next, _)| Cents::from_dollars(next)),
            rate,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedJoint,
}

/// Bracket tables and deduction for one taxing jurisdiction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionTax {
    pub name: String,
    pub ordinary_brackets: Vec<TaxBracket>,
    /// Long-term capital gains table; `None` taxes gains as ordinary income
    #[serde(default)]
    pub capital_gains_brackets: Option<Vec<TaxBracket>>,
    pub standard_deduction: Cents,
    /// Jurisdictions without an income tax always compute zero
    #[serde(default)]
    pub no_income_tax: bool,
}

impl JurisdictionTax {
    #[must_use]
    pub fn none(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinary_brackets: Vec::new(),
            capital_gains_brackets: None,
            standard_deduction: Cents::ZERO,
            no_income_tax: true,
        }
    }

    #[must_use]
    pub fn flat(name: impl Into<String>, rate: f64) -> Self {
        Self {
            name: name.into(),
            ordinary_brackets: bracket_table(&[(0, rate)]),
            capital_gains_brackets: None,
            standard_deduction: Cents::ZERO,
            no_income_tax: false,
        }
    }

    /// 2024 federal tables
    #[must_use]
    pub fn federal_2024(status: FilingStatus) -> Self {
        let (ordinary, gains, deduction) = match status {
            FilingStatus::Single => (
                bracket_table(&[
                    (0, 0.10),
                    (11_600, 0.12),
                    (47_150, 0.22),
                    (100_525, 0.24),
                    (191_950, 0.32),
                    (243_725, 0.35),
                    (609_350, 0.37),
                ]),
                bracket_table(&[(0, 0.0), (47_025, 0.15), (518_900, 0.20)]),
                14_600,
            ),
            FilingStatus::MarriedJoint => (
                bracket_table(&[
                    (0, 0.10),
                    (23_200, 0.12),
                    (94_300, 0.22),
                    (201_050, 0.24),
                    (383_900, 0.32),
                    (487_450, 0.35),
                    (731_200, 0.37),
                ]),
                bracket_table(&[(0, 0.0), (94_050, 0.15), (583_750, 0.20)]),
                29_200,
            ),
        };
        Self {
            name: "federal".into(),
            ordinary_brackets: ordinary,
            capital_gains_brackets: Some(gains),
            standard_deduction: Cents::from_dollars(deduction),
            no_income_tax: false,
        }
    }

    /// State tables for a two-letter postal code.
    ///
    /// Unknown codes fall back to a flat 5% rate.
    #[must_use]
    pub fn state_2024(code: &str, status: FilingStatus) -> Self {
        let code = code.to_ascii_uppercase();
        let joint = status == FilingStatus::MarriedJoint;
        match code.as_str() {
            "AK" | "FL" | "NV" | "NH" | "SD" | "TN" | "TX" | "WA" | "WY" => Self::none(code),
            "IL" => Self::flat(code, 0.0495),
            "PA" => Self::flat(code, 0.0307),
            "MI" => Self::flat(code, 0.0425),
            "IN" => Self::flat(code, 0.0305),
            "CO" => Self::flat(code, 0.044),
            "NC" => Self::flat(code, 0.045),
            "UT" => Self::flat(code, 0.0465),
            "MA" => Self::flat(code, 0.05),
            "CA" => {
                let m = if joint { 2 } else { 1 };
                Self {
                    name: code,
                    ordinary_brackets: bracket_table(&[
                        (0, 0.01),
                        (10_756 * m, 0.02),
                        (25_499 * m, 0.04),
                        (40_245 * m, 0.06),
                        (55_866 * m, 0.08),
                        (70_606 * m, 0.093),
                        (360_659 * m, 0.103),
                        (432_787 * m, 0.113),
                        (721_314 * m, 0.123),
                    ]),
                    capital_gains_brackets: None,
                    standard_deduction: Cents::from_dollars(5_540 * m),
                    no_income_tax: false,
                }
            }
            "NY" => {
                let (table, deduction) = if joint {
                    (
                        bracket_table(&[
                            (0, 0.04),
                            (17_150, 0.045),
                            (23_600, 0.0525),
                            (27_900, 0.055),
                            (161_550, 0.06),
                            (323_200, 0.0685),
                            (2_155_350, 0.0965),
                            (5_000_000, 0.103),
                            (25_000_000, 0.109),
                        ]),
                        16_050,
                    )
                } else {
                    (
                        bracket_table(&[
                            (0, 0.04),
                            (8_500, 0.045),
                            (11_700, 0.0525),
                            (13_900, 0.055),
                            (80_650, 0.06),
                            (215_400, 0.0685),
                            (1_077_550, 0.0965),
                            (5_000_000, 0.103),
                            (25_000_000, 0.109),
                        ]),
                        8_000,
                    )
                };
                Self {
                    name: code,
                    ordinary_brackets: table,
                    capital_gains_brackets: None,
                    standard_deduction: Cents::from_dollars(deduction),
                    no_income_tax: false,
                }
            }
            _ => Self::flat(code, 0.05),
        }
    }

    /// Upper bound of the first bracket taxed at `rate`, if the table has one
    #[must_use]
    pub fn bracket_ceiling_for_rate(&self, rate: f64) -> Option<Option<Cents>> {
        self.ordinary_brackets
            .iter()
            .find(|b| (b.rate - rate).abs() < 1e-9)
            .map(|b| b.max)
    }
}

/// Payroll tax settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FicaConfig {
    pub social_security_rate: f64,
    pub social_security_wage_base: Cents,
    pub medicare_rate: f64,
    pub additional_medicare_rate: f64,
    pub additional_medicare_threshold: Cents,
}

impl FicaConfig {
    #[must_use]
    pub fn for_2024(status: FilingStatus) -> Self {
        Self {
            social_security_rate: 0.062,
            social_security_wage_base: Cents::from_dollars(168_600),
            medicare_rate: 0.0145,
            additional_medicare_rate: 0.009,
            additional_medicare_threshold: match status {
                FilingStatus::Single => Cents::from_dollars(200_000),
                FilingStatus::MarriedJoint => Cents::from_dollars(250_000),
            },
        }
    }
}

/// Complete tax profile for a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxProfile {
    pub filing_status: FilingStatus,
    pub federal: JurisdictionTax,
    pub state: JurisdictionTax,
    pub fica: FicaConfig,
    /// Net Investment Income Tax rate (3.8%)
    pub niit_rate: f64,
    /// Modified AGI above which NIIT applies
    pub niit_threshold: Cents,
    /// Penalty on tax-deferred withdrawals before 59½
    pub early_withdrawal_penalty_rate: f64,
    /// Net capital loss deductible against ordinary income each year
    pub capital_loss_ordinary_limit: Cents,
    /// Provisional-income thresholds for Social Security taxation (50% tier, 85% tier)
    pub social_security_thresholds: (Cents, Cents),
}

impl TaxProfile {
    /// 2024 figures for a filing status and a state postal code
    #[must_use]
    pub fn for_filing_status(status: FilingStatus, state_code: &str) -> Self {
        let (niit_threshold, ss_thresholds) = match status {
            FilingStatus::Single => (200_000, (25_000, 34_000)),
            FilingStatus::MarriedJoint => (250_000, (32_000, 44_000)),
        };
        Self {
            filing_status: status,
            federal: JurisdictionTax::federal_2024(status),
            state: JurisdictionTax::state_2024(state_code, status),
            fica: FicaConfig::for_2024(status),
            niit_rate: 0.038,
            niit_threshold: Cents::from_dollars(niit_threshold),
            early_withdrawal_penalty_rate: 0.10,
            capital_loss_ordinary_limit: Cents::from_dollars(3_000),
            social_security_thresholds: (
                Cents::from_dollars(ss_thresholds.0),
                Cents::from_dollars(ss_thresholds.1),
            ),
        }
    }
}

impl Default for TaxProfile {
    /// 2024 US federal brackets (single filer) with a flat 5% state tax
    fn default() -> Self {
        Self::for_filing_status(FilingStatus::Single, "default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_table_is_contiguous() {
        let federal = JurisdictionTax::federal_2024(FilingStatus::Single);
        for pair in federal.ordinary_brackets.windows(2) {
            assert_eq!(pair[0].max, Some(pair[1].min));
        }
        assert_eq!(federal.ordinary_brackets.last().unwrap().max, None);
    }

    #[test]
    fn test_no_income_tax_states() {
        for code in ["TX", "fl", "WA"] {
            assert!(JurisdictionTax::state_2024(code, FilingStatus::Single).no_income_tax);
        }
        assert!(!JurisdictionTax::state_2024("CA", FilingStatus::Single).no_income_tax);
    }

    #[test]
    fn test_bracket_ceiling_lookup() {
        let federal = JurisdictionTax::federal_2024(FilingStatus::Single);
        assert_eq!(
            federal.bracket_ceiling_for_rate(0.22),
            Some(Some(Cents::from_dollars(100_525)))
        );
        assert_eq!(federal.bracket_ceiling_for_rate(0.37), Some(None));
        assert_eq!(federal.bracket_ceiling_for_rate(0.50), None);
    }
}
