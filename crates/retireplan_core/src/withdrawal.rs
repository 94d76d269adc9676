//! Withdrawal allocation across accounts
//!
//! Given a funding need and the current account snapshots, decide how much to
//! take from each account. Mandatory distributions are layered in first and
//! counted against the need; the remainder follows the plan's strategy.
//! Allocation never takes more than an account holds, and real assets and
//! debts are never drawn from.

use crate::model::{Account, Cents, TaxCharacter, WithdrawalStrategy};

/// Per-account withdrawal vector, parallel to the accounts slice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithdrawalPlan {
    pub per_account: Vec<Cents>,
    pub total: Cents,
    /// Part of `total` taken to satisfy mandatory distributions
    pub mandatory: Cents,
}

impl WithdrawalPlan {
    #[must_use]
    pub fn empty(num_accounts: usize) -> Self {
        Self {
            per_account: vec![Cents::ZERO; num_accounts],
            total: Cents::ZERO,
            mandatory: Cents::ZERO,
        }
    }
}

/// Allocate `need` across `accounts`.
///
/// `mandatory` is parallel to `accounts` and is always taken (capped by each
/// balance), even when it exceeds `need`. The discretionary remainder is
/// `need - mandatory`; the total is `max(need, mandatory)` capped at what the
/// withdrawable accounts hold.
pub fn allocate_withdrawals(
    strategy: WithdrawalStrategy,
    accounts: &[Account],
    need: Cents,
    mandatory: &[Cents],
) -> WithdrawalPlan {
    let mut plan = WithdrawalPlan::empty(accounts.len());

    for (idx, account) in accounts.iter().enumerate() {
        if !account.is_withdrawable() {
            continue;
        }
        let required = mandatory.get(idx).copied().unwrap_or(Cents::ZERO);
        let take = required.non_negative().min(account.balance.non_negative());
        plan.per_account[idx] = take;
        plan.mandatory += take;
    }

    let remaining = (need - plan.mandatory).non_negative();
    let available: Vec<Cents> = accounts
        .iter()
        .zip(&plan.per_account)
        .map(|(a, taken)| {
            if a.is_withdrawable() {
                (a.balance - *taken).non_negative()
            } else {
                Cents::ZERO
            }
        })
        .collect();

    let discretionary = match strategy {
        WithdrawalStrategy::Proportional => proportional(&available, remaining),
        WithdrawalStrategy::TaxEfficient => {
            ordered(accounts, &available, remaining, tax_efficient_tier)
        }
        WithdrawalStrategy::TaxAware => ordered(accounts, &available, remaining, tax_aware_tier),
    };

    for (slot, extra) in plan.per_account.iter_mut().zip(discretionary) {
        *slot += extra;
    }
    plan.total = plan.per_account.iter().sum();
    plan
}

/// Split in proportion to available balances, residual cents to the first
/// accounts with room
fn proportional(available: &[Cents], need: Cents) -> Vec<Cents> {
    let total: Cents = available.iter().sum();
    if !need.is_positive() || !total.is_positive() {
        return vec![Cents::ZERO; available.len()];
    }
    if need >= total {
        return available.to_vec();
    }

    // floor each share so the residual is never negative
    let mut shares: Vec<Cents> = available
        .iter()
        .map(|a| Cents((need.0 as i128 * a.0 as i128 / total.0 as i128) as i64).min(*a))
        .collect();

    let mut residual = need - shares.iter().sum::<Cents>();
    for (share, cap) in shares.iter_mut().zip(available) {
        if !residual.is_positive() {
            break;
        }
        let room = *cap - *share;
        let extra = room.min(residual);
        *share += extra;
        residual -= extra;
    }
    shares
}

/// Drain accounts tier by tier, plan order inside a tier
fn ordered(
    accounts: &[Account],
    available: &[Cents],
    need: Cents,
    tier: fn(TaxCharacter) -> u8,
) -> Vec<Cents> {
    let mut order: Vec<usize> = (0..accounts.len()).collect();
    // stable sort keeps plan order within a tier
    order.sort_by_key(|&idx| tier(accounts[idx].tax_character));

    let mut out = vec![Cents::ZERO; accounts.len()];
    let mut remaining = need.non_negative();
    for idx in order {
        if !remaining.is_positive() {
            break;
        }
        let take = available[idx].min(remaining);
        out[idx] = take;
        remaining -= take;
    }
    out
}

/// Tax-free first, taxable next, tax-deferred last
fn tax_efficient_tier(character: TaxCharacter) -> u8 {
    match character {
        TaxCharacter::TaxFree | TaxCharacter::TaxDeductible => 0,
        TaxCharacter::Taxable => 1,
        TaxCharacter::TaxDeferred => 2,
    }
}

/// Taxable always first, then tax-free, tax-deferred last
fn tax_aware_tier(character: TaxCharacter) -> u8 {
    match character {
        TaxCharacter::Taxable => 0,
        TaxCharacter::TaxFree | TaxCharacter::TaxDeductible => 1,
        TaxCharacter::TaxDeferred => 2,
    }
}
