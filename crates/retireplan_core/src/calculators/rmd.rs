//! Required minimum distributions and qualified charitable distributions

use crate::model::{Account, Cents, QcdStrategy, RmdTable};

/// Minimum distribution owed for one account balance.
///
/// Zero before the start age. Ages below the first tabulated age (possible
/// with an overridden start age) use the first divisor.
pub fn calculate_rmd(balance: Cents, age: u32, start_age: u32, table: &RmdTable) -> Cents {
    if age < start_age || !balance.is_positive() {
        return Cents::ZERO;
    }
    let divisor = table
        .divisor_at_or_after(age)
        .or_else(|| table.entries.first().map(|e| e.divisor));
    match divisor {
        Some(d) if d > 0.0 => Cents((balance.as_f64() / d).round() as i64),
        _ => Cents::ZERO,
    }
}

/// RMD for every account, zero for accounts that are not tax-deferred
pub fn rmds_for_accounts(
    accounts: &[Account],
    age: u32,
    start_age: u32,
    table: &RmdTable,
) -> Vec<Cents> {
    accounts
        .iter()
        .map(|a| {
            if a.is_rmd_eligible() {
                calculate_rmd(a.balance, age, start_age, table)
            } else {
                Cents::ZERO
            }
        })
        .collect()
}

#[must_use]
pub fn qcd_eligible(age: u32, min_age: u32) -> bool {
    age >= min_age
}

/// Per-account QCD amounts for one year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QcdAllocation {
    /// `(account_index, amount)` in plan order, zero amounts omitted
    pub per_account: Vec<(usize, Cents)>,
    pub total: Cents,
    /// Portion of the year's RMDs the distributions count toward
    pub rmd_satisfied: Cents,
}

/// Size QCDs across traditional accounts.
///
/// `rmds` is parallel to `accounts`. The aggregate is capped at `annual_cap`,
/// filled in plan order, and no account gives more than its balance.
pub fn size_qcd(
    strategy: QcdStrategy,
    accounts: &[Account],
    rmds: &[Cents],
    annual_cap: Cents,
) -> QcdAllocation {
    let mut remaining_cap = annual_cap.non_negative();
    let mut fixed_remaining = match strategy {
        QcdStrategy::Fixed { annual_amount } => annual_amount.non_negative(),
        _ => Cents::ZERO,
    };
    let mut allocation = QcdAllocation::default();

    for (idx, account) in accounts.iter().enumerate() {
        if !remaining_cap.is_positive() {
            break;
        }
        if !account.is_traditional() || !account.balance.is_positive() {
            continue;
        }
        let rmd = rmds.get(idx).copied().unwrap_or(Cents::ZERO);

        let wanted = match strategy {
            QcdStrategy::Fixed { .. } => fixed_remaining,
            QcdStrategy::PercentageOfBalance { fraction } => {
                account.balance.scale(fraction.clamp(0.0, 1.0))
            }
            QcdStrategy::RmdMatching => rmd,
        };
        let amount = wanted.min(account.balance).min(remaining_cap);
        if !amount.is_positive() {
            continue;
        }

        remaining_cap -= amount;
        if matches!(strategy, QcdStrategy::Fixed { .. }) {
            fixed_remaining -= amount;
        }
        allocation.per_account.push((idx, amount));
        allocation.total += amount;
        allocation.rmd_satisfied += amount.min(rmd);
    }

    allocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountId, AccountKind};

    fn ira(id: u16, dollars: i64) -> Account {
        Account {
            account_id: AccountId(id),
            name: format!("IRA {id}"),
            kind: AccountKind::TraditionalIra,
            balance: Cents::from_dollars(dollars),
            cost_basis: None,
            growth_rate: None,
            tax_character: AccountKind::TraditionalIra.default_tax_character(),
            annual_contribution: Cents::ZERO,
            contribution_basis: Cents::ZERO,
        }
    }

    #[test]
    fn test_rmd_zero_before_start_age() {
        let table = RmdTable::default();
        for age in 50..73 {
            assert_eq!(
                calculate_rmd(Cents::from_dollars(500_000), age, 73, &table),
                Cents::ZERO
            );
        }
    }

    #[test]
    fn test_rmd_uses_table_divisor() {
        let table = RmdTable::default();
        // 265,000 / 26.5 = 10,000
        assert_eq!(
            calculate_rmd(Cents::from_dollars(265_000), 73, 73, &table),
            Cents::from_dollars(10_000)
        );
        // past the table end the last divisor is reused
        assert_eq!(
            calculate_rmd(Cents::from_dollars(20_000), 125, 73, &table),
            Cents::from_dollars(10_000)
        );
    }

    #[test]
    fn test_qcd_rmd_matching_satisfies_rmd() {
        let accounts = vec![ira(0, 265_000), ira(1, 53_000)];
        let table = RmdTable::default();
        let rmds = rmds_for_accounts(&accounts, 73, 73, &table);
        let qcd = size_qcd(
            QcdStrategy::RmdMatching,
            &accounts,
            &rmds,
            Cents::from_dollars(105_000),
        );
        assert_eq!(qcd.total, Cents::from_dollars(12_000));
        assert_eq!(qcd.rmd_satisfied, qcd.total);
        assert_eq!(qcd.per_account.len(), 2);
    }

    #[test]
    fn test_qcd_fixed_respects_cap_and_order() {
        let accounts = vec![ira(0, 3_000), ira(1, 50_000)];
        let rmds = vec![Cents::ZERO; 2];
        let qcd = size_qcd(
            QcdStrategy::Fixed {
                annual_amount: Cents::from_dollars(10_000),
            },
            &accounts,
            &rmds,
            Cents::from_dollars(8_000),
        );
        assert_eq!(
            qcd.per_account,
            vec![(0, Cents::from_dollars(3_000)), (1, Cents::from_dollars(5_000))]
        );
        assert_eq!(qcd.total, Cents::from_dollars(8_000));
        assert_eq!(qcd.rmd_satisfied, Cents::ZERO);
    }
}
