//! Tax calculation
//!
//! Progressive-bracket ordinary and capital-gains tax, payroll tax, Net
//! Investment Income Tax and Social Security taxation. Federal and state
//! share the same bracket-walking code but use their own tables. All inputs
//! and outputs are whole cents; bracket sums are accumulated in `f64` and
//! rounded once per table.

use crate::model::{Cents, FicaConfig, JurisdictionTax, TaxBracket, TaxImpact, TaxProfile};

/// Total tax owed on `income` under a progressive table
pub fn calculate_bracket_tax(income: Cents, brackets: &[TaxBracket]) -> Cents {
    if !income.is_positive() || brackets.is_empty() {
        return Cents::ZERO;
    }

    let mut tax = 0.0;
    for bracket in brackets {
        if income <= bracket.min {
            break;
        }
        let top = bracket.max.map_or(income, |max| income.min(max));
        let taxable_in_bracket = (top - bracket.min).non_negative();
        tax += taxable_in_bracket.as_f64() * bracket.rate;
    }

    Cents(tax.round() as i64)
}

/// Rate of the highest bracket reached by `income`
pub fn marginal_rate(income: Cents, brackets: &[TaxBracket]) -> f64 {
    brackets
        .iter()
        .take_while(|b| b.min <= income.non_negative())
        .last()
        .map(|b| b.rate)
        .unwrap_or(0.0)
}

/// Total tax divided by total income, 0 when there is no income
pub fn effective_rate(tax: Cents, income: Cents) -> f64 {
    tax.ratio(income)
}

/// Tax, marginal and effective rate for one progressive calculation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BracketTaxResult {
    pub tax: Cents,
    pub marginal_rate: f64,
    pub effective_rate: f64,
}

pub fn calculate_progressive_tax(income: Cents, brackets: &[TaxBracket]) -> BracketTaxResult {
    let tax = calculate_bracket_tax(income, brackets);
    BracketTaxResult {
        tax,
        marginal_rate: marginal_rate(income, brackets),
        effective_rate: effective_rate(tax, income),
    }
}

/// Tax on additional income stacked on top of existing income
pub fn calculate_marginal_tax(
    additional_income: Cents,
    existing_income: Cents,
    brackets: &[TaxBracket],
) -> Cents {
    calculate_bracket_tax(existing_income + additional_income, brackets)
        - calculate_bracket_tax(existing_income, brackets)
}

/// Ordinary-income tax for a jurisdiction, after its standard deduction
pub fn calculate_jurisdiction_tax(gross_income: Cents, jurisdiction: &JurisdictionTax) -> Cents {
    if jurisdiction.no_income_tax {
        return Cents::ZERO;
    }
    let taxable = (gross_income - jurisdiction.standard_deduction).non_negative();
    calculate_bracket_tax(taxable, &jurisdiction.ordinary_brackets)
}

/// Long-term gains tax with the gains stacked on top of ordinary taxable income
pub fn calculate_capital_gains_tax(
    gains: Cents,
    ordinary_taxable: Cents,
    jurisdiction: &JurisdictionTax,
) -> Cents {
    if jurisdiction.no_income_tax || !gains.is_positive() {
        return Cents::ZERO;
    }
    let table = jurisdiction
        .capital_gains_brackets
        .as_deref()
        .unwrap_or(&jurisdiction.ordinary_brackets);
    calculate_marginal_tax(gains, ordinary_taxable.non_negative(), table)
}

/// Social Security plus Medicare (and Additional Medicare) on wages
pub fn calculate_fica(wages: Cents, fica: &FicaConfig) -> Cents {
    if !wages.is_positive() {
        return Cents::ZERO;
    }
    let social_security = wages
        .min(fica.social_security_wage_base)
        .scale(fica.social_security_rate);
    let medicare = wages.scale(fica.medicare_rate);
    let additional = (wages - fica.additional_medicare_threshold)
        .non_negative()
        .scale(fica.additional_medicare_rate);
    social_security + medicare + additional
}

/// Net Investment Income Tax on the lesser of NII and MAGI over the threshold
pub fn calculate_niit(net_investment_income: Cents, magi: Cents, profile: &TaxProfile) -> Cents {
    let excess = (magi - profile.niit_threshold).non_negative();
    net_investment_income
        .non_negative()
        .min(excess)
        .scale(profile.niit_rate)
}

/// Taxable portion of a Social Security benefit under the provisional-income test
pub fn taxable_social_security(
    benefit: Cents,
    other_income: Cents,
    thresholds: (Cents, Cents),
) -> Cents {
    if !benefit.is_positive() {
        return Cents::ZERO;
    }
    let (base, upper) = thresholds;
    let provisional = other_income + benefit.scale(0.5);
    if provisional <= base {
        Cents::ZERO
    } else if provisional <= upper {
        (provisional - base).scale(0.5).min(benefit.scale(0.5))
    } else {
        let first_tier = benefit.scale(0.5).min((upper - base).scale(0.5));
        ((provisional - upper).scale(0.85) + first_tier).min(benefit.scale(0.85))
    }
}

/// Gain realized by withdrawing from a taxable account.
///
/// Cost basis is allocated in proportion to the withdrawn fraction of the
/// balance. Returns `(gain, basis_used)`.
pub fn capital_gain_on_withdrawal(
    withdrawal: Cents,
    balance: Cents,
    cost_basis: Cents,
) -> (Cents, Cents) {
    if !withdrawal.is_positive() || !balance.is_positive() {
        return (Cents::ZERO, Cents::ZERO);
    }
    let withdrawal = withdrawal.min(balance);
    let basis_used = cost_basis.non_negative().pro_rata(withdrawal, balance);
    ((withdrawal - basis_used).non_negative(), basis_used)
}

/// Loss realized by withdrawing from a taxable account whose basis exceeds
/// its balance
pub fn capital_loss_on_withdrawal(withdrawal: Cents, balance: Cents, cost_basis: Cents) -> Cents {
    let (_, basis_used) = capital_gain_on_withdrawal(withdrawal, balance, cost_basis);
    (basis_used - withdrawal.min(balance)).non_negative()
}

/// Combined federal + state marginal rate on the next dollar of ordinary income
pub fn combined_marginal_rate(ordinary_income: Cents, profile: &TaxProfile) -> f64 {
    let federal_taxable = (ordinary_income - profile.federal.standard_deduction).non_negative();
    let federal = marginal_rate(federal_taxable, &profile.federal.ordinary_brackets);
    let state = if profile.state.no_income_tax {
        0.0
    } else {
        let state_taxable = (ordinary_income - profile.state.standard_deduction).non_negative();
        marginal_rate(state_taxable, &profile.state.ordinary_brackets)
    };
    federal + state
}

// ============================================================================
// Whole-year settlement
// ============================================================================

/// Everything that feeds one year's tax bill
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YearTaxInputs {
    /// Earned income, FICA base (already included in `ordinary_income`)
    pub wages: Cents,
    /// Ordinary income before deductions and before Social Security
    pub ordinary_income: Cents,
    pub social_security: Cents,
    pub capital_gains: Cents,
    /// Losses realized this year
    pub capital_losses: Cents,
    /// Unused losses carried in from earlier years
    pub loss_carryforward: Cents,
    /// Tax-deferred or Roth-earnings withdrawals subject to the early penalty
    pub penalized_withdrawals: Cents,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YearTaxResult {
    pub impact: TaxImpact,
    pub taxable_social_security: Cents,
    pub net_capital_gains: Cents,
    /// Losses left over for next year
    pub remaining_carryforward: Cents,
}

/// Compute one year's full tax bill
pub fn calculate_year_tax(inputs: &YearTaxInputs, profile: &TaxProfile) -> YearTaxResult {
    // Net gains and losses, then the ordinary-income offset for excess losses
    let total_losses = inputs.capital_losses + inputs.loss_carryforward;
    let net_gains = (inputs.capital_gains - total_losses).non_negative();
    let excess_loss = (total_losses - inputs.capital_gains).non_negative();
    let ordinary_offset = excess_loss
        .min(profile.capital_loss_ordinary_limit)
        .min(inputs.ordinary_income.non_negative());
    let remaining_carryforward = excess_loss - ordinary_offset;

    let ss_taxable = taxable_social_security(
        inputs.social_security,
        inputs.ordinary_income + net_gains,
        profile.social_security_thresholds,
    );

    let ordinary_gross = (inputs.ordinary_income + ss_taxable - ordinary_offset).non_negative();
    let agi = ordinary_gross + net_gains;

    // Federal: the deduction soaks up ordinary income first, then gains
    let federal = &profile.federal;
    let ordinary_taxable = (ordinary_gross - federal.standard_deduction).non_negative();
    let leftover_deduction = (federal.standard_deduction - ordinary_gross).non_negative();
    let gains_taxable = (net_gains - leftover_deduction).non_negative();

    let federal_income_tax = calculate_bracket_tax(ordinary_taxable, &federal.ordinary_brackets);
    let capital_gains_tax = calculate_capital_gains_tax(gains_taxable, ordinary_taxable, federal);
    let niit = calculate_niit(net_gains, agi, profile);
    let fica = calculate_fica(inputs.wages, &profile.fica);

    // State: Social Security is exempt, gains use the state's own table when it has one
    let state = &profile.state;
    let state_ordinary = (inputs.ordinary_income - ordinary_offset).non_negative();
    let state_tax = if state.no_income_tax {
        Cents::ZERO
    } else if state.capital_gains_brackets.is_some() {
        let state_ordinary_taxable = (state_ordinary - state.standard_deduction).non_negative();
        let state_leftover = (state.standard_deduction - state_ordinary).non_negative();
        calculate_bracket_tax(state_ordinary_taxable, &state.ordinary_brackets)
            + calculate_capital_gains_tax(
                (net_gains - state_leftover).non_negative(),
                state_ordinary_taxable,
                state,
            )
    } else {
        calculate_jurisdiction_tax(state_ordinary + net_gains, state)
    };

    let early_withdrawal_penalty = inputs
        .penalized_withdrawals
        .non_negative()
        .scale(profile.early_withdrawal_penalty_rate);

    let total =
        federal_income_tax + capital_gains_tax + state_tax + fica + niit + early_withdrawal_penalty;
    let gross_income = inputs.ordinary_income + inputs.social_security + net_gains;

    YearTaxResult {
        impact: TaxImpact {
            federal_income_tax,
            capital_gains_tax,
            state_tax,
            fica,
            niit,
            early_withdrawal_penalty,
            total,
            marginal_rate: combined_marginal_rate(ordinary_gross, profile),
            effective_rate: effective_rate(total, gross_income),
        },
        taxable_social_security: ss_taxable,
        net_capital_gains: net_gains,
        remaining_carryforward,
    }
}
