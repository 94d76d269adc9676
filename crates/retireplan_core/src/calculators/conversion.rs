//! Roth conversion sizing, backdoor pro-rata math and penalty-free access

use serde::{Deserialize, Serialize};

use crate::model::{Account, Cents, TaxCharacter};

/// Age (at year start) from which retirement withdrawals are penalty-free
pub const PENALTY_FREE_AGE: u32 = 60;

/// Years a converted amount must season before it can leave a Roth penalty-free
pub const CONVERSION_SEASONING_YEARS: u32 = 5;

// ============================================================================
// Conversion sizing
// ============================================================================

/// Fixed target, capped by the balance left after this year's mandatory RMD
pub fn fixed_conversion(target: Cents, traditional_balance: Cents, rmd_required: Cents) -> Cents {
    let convertible = (traditional_balance - rmd_required).non_negative();
    target.non_negative().min(convertible)
}

/// Convert just enough to bring taxable income up to `ceiling`.
///
/// A `None` ceiling (top bracket) converts everything convertible. Income
/// already at or past the ceiling converts nothing.
pub fn bracket_fill_conversion(
    taxable_income: Cents,
    ceiling: Option<Cents>,
    convertible: Cents,
) -> Cents {
    let convertible = convertible.non_negative();
    match ceiling {
        Some(top) => (top - taxable_income).non_negative().min(convertible),
        None => convertible,
    }
}

/// A fraction of the traditional balance, never more than the balance
pub fn percentage_conversion(fraction: f64, traditional_balance: Cents) -> Cents {
    let balance = traditional_balance.non_negative();
    balance.scale(fraction.max(0.0)).min(balance)
}

// ============================================================================
// Backdoor contributions
// ============================================================================

/// Taxable split of a backdoor conversion under the pro-rata rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProRataSplit {
    /// Pre-tax share: preexisting / (preexisting + contribution)
    pub ratio: f64,
    pub taxable: Cents,
    pub non_taxable: Cents,
}

/// Split a non-deductible contribution converted alongside `preexisting`
/// pre-tax IRA dollars. `taxable + non_taxable == contribution` exactly.
pub fn pro_rata_split(preexisting: Cents, contribution: Cents) -> ProRataSplit {
    let preexisting = preexisting.non_negative();
    let contribution = contribution.non_negative();
    let total = preexisting + contribution;
    let taxable = contribution.pro_rata(preexisting, total);
    ProRataSplit {
        ratio: preexisting.ratio(total),
        taxable,
        non_taxable: contribution - taxable,
    }
}

/// Room left for after-tax 401(k) money under the combined limit.
///
/// The employer match is estimated as `wages * match_rate`, capped at the
/// employee deferral limit.
pub fn mega_backdoor_room(
    total_limit: Cents,
    employee_deferral: Cents,
    wages: Cents,
    match_rate: f64,
    deferral_limit: Cents,
) -> Cents {
    let employer_match = wages.scale(match_rate.max(0.0)).min(deferral_limit);
    (total_limit - employee_deferral.non_negative() - employer_match).non_negative()
}

// ============================================================================
// Penalty-free access
// ============================================================================

/// Converted dollars landing in a Roth account in a given year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionLot {
    pub account_index: usize,
    pub year_offset: u32,
    pub amount: Cents,
}

/// Converted dollars in `account_index` old enough to withdraw without penalty
pub fn seasoned_conversions(
    lots: &[ConversionLot],
    account_index: usize,
    year_offset: u32,
) -> Cents {
    lots.iter()
        .filter(|lot| {
            lot.account_index == account_index
                && year_offset >= lot.year_offset + CONVERSION_SEASONING_YEARS
        })
        .map(|lot| lot.amount)
        .sum()
}

/// Draw `amount` from the seasoned lots of an account, oldest first.
///
/// Returns how much was covered by seasoned lots. Emptied lots are removed.
pub fn consume_seasoned_conversions(
    lots: &mut Vec<ConversionLot>,
    account_index: usize,
    year_offset: u32,
    amount: Cents,
) -> Cents {
    let mut remaining = amount.non_negative();
    let mut consumed = Cents::ZERO;
    for lot in lots.iter_mut().filter(|lot| {
        lot.account_index == account_index
            && year_offset >= lot.year_offset + CONVERSION_SEASONING_YEARS
    }) {
        if !remaining.is_positive() {
            break;
        }
        let take = lot.amount.min(remaining);
        lot.amount -= take;
        remaining -= take;
        consumed += take;
    }
    lots.retain(|lot| lot.amount.is_positive());
    consumed
}

/// Portion of a withdrawal that escapes the early-withdrawal penalty.
///
/// Tax-deferred money is penalised in full before [`PENALTY_FREE_AGE`]. Roth
/// accounts release direct contributions first, then seasoned conversions;
/// earnings are penalised before the penalty-free age. Taxable and HSA
/// withdrawals are never penalised.
pub fn penalty_free_amount(
    account: &Account,
    age: u32,
    amount: Cents,
    seasoned_conversions: Cents,
) -> Cents {
    let amount = amount.non_negative();
    if age >= PENALTY_FREE_AGE {
        return amount;
    }
    match account.tax_character {
        TaxCharacter::TaxDeferred => Cents::ZERO,
        TaxCharacter::TaxFree => amount.min(account.contribution_basis + seasoned_conversions),
        TaxCharacter::Taxable | TaxCharacter::TaxDeductible => amount,
    }
}
