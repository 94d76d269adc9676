//! Optional strategy configurations carried by a plan
//!
//! Each strategy has an `enabled` flag plus its own parameters. The rule
//! implementations in `crate::rules` read these values; nothing here has
//! behavior of its own.

use serde::{Deserialize, Serialize};

use super::money::Cents;

/// How a Roth conversion is sized each year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversionStrategy {
    /// Convert a target amount, capped by the convertible balance
    Fixed { annual_amount: Cents },
    /// Fill taxable income up to the ceiling of the bracket taxed at `target_rate`
    BracketFill { target_rate: f64 },
    /// Convert a fraction of the traditional balance
    Percentage { fraction: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RothConversionSettings {
    pub enabled: bool,
    pub strategy: ConversionStrategy,
    /// Flat rate used to estimate the conversion's tax; the profile's
    /// marginal rate is used when absent
    pub estimated_tax_rate: Option<f64>,
    pub start_age: Option<u32>,
    pub end_age: Option<u32>,
    pub depends_on: Vec<String>,
}

impl Default for RothConversionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: ConversionStrategy::Fixed {
                annual_amount: Cents::from_dollars(20_000),
            },
            estimated_tax_rate: None,
            start_age: None,
            end_age: None,
            depends_on: Vec::new(),
        }
    }
}

/// Default phase-out ceiling for the backdoor Roth strategy
pub const BACKDOOR_INCOME_CEILING: Cents = Cents::from_dollars(1_000_000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdoorRothSettings {
    pub enabled: bool,
    /// Contribution target; the IRA limit when absent
    pub annual_amount: Option<Cents>,
    /// Add the age-50 catch-up to the limit
    pub use_catch_up: bool,
    /// Ordinary income above which the strategy is not used
    pub income_ceiling: Cents,
    pub depends_on: Vec<String>,
}

impl Default for BackdoorRothSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            annual_amount: None,
            use_catch_up: true,
            income_ceiling: BACKDOOR_INCOME_CEILING,
            depends_on: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MegaBackdoorRothSettings {
    pub enabled: bool,
    /// Upper bound on after-tax contributions per year
    pub annual_cap: Cents,
    /// Employee pre-tax deferral; the 401(k)'s scheduled contribution when absent
    pub employee_deferral: Option<Cents>,
    /// Employer match as a fraction of wages
    pub employer_match_rate: f64,
    pub plan_allows_after_tax: bool,
    pub plan_allows_in_service_conversion: bool,
    pub depends_on: Vec<String>,
}

impl Default for MegaBackdoorRothSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            annual_cap: Cents::from_dollars(46_000),
            employee_deferral: None,
            employer_match_rate: 0.05,
            plan_allows_after_tax: false,
            plan_allows_in_service_conversion: false,
            depends_on: Vec::new(),
        }
    }
}

/// How a qualified charitable distribution is sized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QcdStrategy {
    /// Give a fixed total, taken from eligible accounts in plan order
    Fixed { annual_amount: Cents },
    /// Give a fraction of each eligible account's balance
    PercentageOfBalance { fraction: f64 },
    /// Give exactly each account's RMD
    RmdMatching,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcdSettings {
    pub enabled: bool,
    pub strategy: QcdStrategy,
    /// First eligible age; the RMD start age when absent
    pub min_age: Option<u32>,
    /// Aggregate yearly cap; the plan's QCD limit when absent
    pub annual_cap: Option<Cents>,
    pub depends_on: Vec<String>,
}

impl Default for QcdSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: QcdStrategy::RmdMatching,
            min_age: None,
            annual_cap: None,
            depends_on: Vec::new(),
        }
    }
}

/// How much of the available loss to harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStrategy {
    /// Realize every unrealized loss
    All,
    /// Realize only enough to offset current-year capital gains
    OffsetGains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxLossHarvestingSettings {
    pub enabled: bool,
    pub strategy: HarvestStrategy,
    /// Targets below this are not worth harvesting
    pub min_loss_threshold: Cents,
    /// Fraction of the harvest lost to wash-sale disallowance
    pub wash_sale_haircut: f64,
    pub depends_on: Vec<String>,
}

impl Default for TaxLossHarvestingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: HarvestStrategy::OffsetGains,
            min_loss_threshold: Cents::from_dollars(1_000),
            wash_sale_haircut: 0.0,
            depends_on: Vec::new(),
        }
    }
}

/// All optional strategies for a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub roth_conversion: RothConversionSettings,
    pub backdoor_roth: BackdoorRothSettings,
    pub mega_backdoor_roth: MegaBackdoorRothSettings,
    pub qcd: QcdSettings,
    pub tax_loss_harvesting: TaxLossHarvestingSettings,
}
