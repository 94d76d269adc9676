//! Annual contribution and distribution limits

use serde::{Deserialize, Serialize};

use super::accounts::AccountKind;
use super::money::Cents;

/// IRS dollar limits for one tax year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionLimits {
    /// 401(k) employee elective deferral
    pub employee_deferral: Cents,
    /// Extra deferral allowed from age 50
    pub deferral_catch_up: Cents,
    /// 415(c) combined employee + employer limit
    pub total_401k: Cents,
    pub ira: Cents,
    /// Extra IRA contribution allowed from age 50
    pub ira_catch_up: Cents,
    pub hsa: Cents,
    /// Extra HSA contribution allowed from age 55
    pub hsa_catch_up: Cents,
    /// Per-person annual QCD ceiling
    pub qcd_annual: Cents,
}

impl ContributionLimits {
    #[must_use]
    pub fn for_2024() -> Self {
        Self {
            employee_deferral: Cents::from_dollars(23_000),
            deferral_catch_up: Cents::from_dollars(7_500),
            total_401k: Cents::from_dollars(69_000),
            ira: Cents::from_dollars(7_000),
            ira_catch_up: Cents::from_dollars(1_000),
            hsa: Cents::from_dollars(4_150),
            hsa_catch_up: Cents::from_dollars(1_000),
            qcd_annual: Cents::from_dollars(105_000),
        }
    }

    /// Employee deferral limit including catch-up
    #[must_use]
    pub fn deferral_limit(&self, age: u32) -> Cents {
        if age >= 50 {
            self.employee_deferral + self.deferral_catch_up
        } else {
            self.employee_deferral
        }
    }

    /// IRA contribution limit including catch-up
    #[must_use]
    pub fn ira_limit(&self, age: u32) -> Cents {
        if age >= 50 {
            self.ira + self.ira_catch_up
        } else {
            self.ira
        }
    }

    /// Yearly contribution cap for an account kind, `None` when uncapped
    #[must_use]
    pub fn annual_limit(&self, kind: AccountKind, age: u32) -> Option<Cents> {
        match kind {
            AccountKind::Traditional401k => Some(self.deferral_limit(age)),
            AccountKind::TraditionalIra | AccountKind::Roth => Some(self.ira_limit(age)),
            AccountKind::Hsa if age >= 55 => Some(self.hsa + self.hsa_catch_up),
            AccountKind::Hsa => Some(self.hsa),
            AccountKind::Taxable
            | AccountKind::RealAsset
            | AccountKind::Debt
            | AccountKind::TaxAdvantaged => None,
        }
    }
}

impl Default for ContributionLimits {
    fn default() -> Self {
        Self::for_2024()
    }
}
