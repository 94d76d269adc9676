//! Tax-loss harvesting

use crate::model::{Account, Cents, HarvestStrategy};

/// A taxable account sitting on an unrealized loss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestCandidate {
    pub account_index: usize,
    pub unrealized_loss: Cents,
}

/// Taxable accounts with a tracked basis above their balance, in plan order
pub fn find_harvest_candidates(accounts: &[Account]) -> Vec<HarvestCandidate> {
    accounts
        .iter()
        .enumerate()
        .filter(|(_, a)| a.has_tracked_basis())
        .map(|(idx, a)| HarvestCandidate {
            account_index: idx,
            unrealized_loss: a.unrealized_loss(),
        })
        .filter(|c| c.unrealized_loss.is_positive())
        .collect()
}

/// Loss the strategy wants to realize before any haircut
pub fn harvest_target(strategy: HarvestStrategy, total_loss: Cents, current_gains: Cents) -> Cents {
    match strategy {
        HarvestStrategy::All => total_loss.non_negative(),
        HarvestStrategy::OffsetGains => total_loss.non_negative().min(current_gains.non_negative()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestPlan {
    pub target: Cents,
    /// Loss recognised after the wash-sale haircut
    pub realized: Cents,
    /// `(account_index, realized loss)` per account
    pub per_account: Vec<(usize, Cents)>,
}

/// Size a harvest across candidates.
///
/// Returns `None` when the target falls below `min_loss_threshold`. The target
/// is taken from accounts in plan order, each up to its own loss.
pub fn plan_harvest(
    candidates: &[HarvestCandidate],
    strategy: HarvestStrategy,
    current_gains: Cents,
    min_loss_threshold: Cents,
    wash_sale_haircut: f64,
) -> Option<HarvestPlan> {
    let total_loss: Cents = candidates.iter().map(|c| c.unrealized_loss).sum();
    let target = harvest_target(strategy, total_loss, current_gains);
    if !target.is_positive() || target < min_loss_threshold {
        return None;
    }

    let keep = 1.0 - wash_sale_haircut.clamp(0.0, 1.0);
    let mut remaining = target;
    let mut per_account = Vec::new();
    for candidate in candidates {
        if !remaining.is_positive() {
            break;
        }
        let take = candidate.unrealized_loss.min(remaining);
        remaining -= take;
        per_account.push((candidate.account_index, take.scale(keep)));
    }

    let realized = per_account.iter().map(|(_, loss)| *loss).sum();
    Some(HarvestPlan {
        target,
        realized,
        per_account,
    })
}
