//! Strategy rules
//!
//! Every optional strategy is a rule with a uniform contract: metadata
//! (name, description, category, dependencies), a parameter schema with
//! bounds, a side-effect-free applicability predicate and an `apply` that
//! returns a [`RuleResult`]. The set of rules is closed: [`StrategyRule`] is a
//! sum type over the five implementations and dispatches through the [`Rule`]
//! trait.
//!
//! Rules are built from a plan's [`StrategySettings`] by tag ([`RuleKind`]),
//! registered in a [`RuleRegistry`] and run in dependency order by the
//! [`RuleEngine`].

mod backdoor_roth;
mod engine;
mod mega_backdoor;
mod qcd;
mod registry;
mod roth_conversion;
mod tax_loss_harvesting;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RuleError};
use crate::model::{Plan, ProjectionState, RuleResult, StrategySettings};

pub use backdoor_roth::BackdoorRothRule;
pub use engine::{RuleEngine, RuleProjectionSummary};
pub use mega_backdoor::MegaBackdoorRothRule;
pub use qcd::QcdRule;
pub use registry::{DependencyReport, RuleRegistry};
pub use roth_conversion::RothConversionRule;
pub use tax_loss_harvesting::TaxLossHarvestingRule;

/// Reason recorded when a rule's applicability predicate is false
pub const NOT_APPLICABLE: &str = "not_applicable";

// ============================================================================
// Contract
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    TaxOptimization,
    WithdrawalStrategy,
    ContributionStrategy,
    RetirementPlanning,
}

/// Identity and scheduling information for a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    /// Names of rules that must run first
    pub dependencies: Vec<String>,
}

/// One tunable numeric parameter with its default and inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    /// Value the rule is configured with
    pub value: f64,
}

impl ParamSpec {
    #[must_use]
    pub fn new(
        name: &'static str,
        description: &'static str,
        default: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            name,
            description,
            default,
            min,
            max,
            value: default,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn in_bounds(&self) -> bool {
        self.value.is_finite() && self.value >= self.min && self.value <= self.max
    }
}

/// Read-only view a rule gets of the year being projected
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub plan: &'a Plan,
    pub year_offset: u32,
    pub state: &'a ProjectionState,
}

impl RuleContext<'_> {
    #[must_use]
    pub fn age(&self) -> u32 {
        self.state.meta.age
    }

    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.state.meta.is_retired
    }

    /// Ordinary income for the year so far, net of pre-tax contributions,
    /// including any RMD still to be withdrawn
    #[must_use]
    pub fn projected_ordinary_income(&self) -> crate::model::Cents {
        let totals = &self.state.totals;
        (totals.ordinary_income - totals.pre_tax_contributions + totals.rmd_outstanding())
            .non_negative()
    }
}

/// Uniform rule contract
pub trait Rule {
    fn metadata(&self) -> RuleMetadata;

    /// Parameter schema with the configured values filled in
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Check every parameter against its bounds
    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.metadata().name;
        match self.parameters().into_iter().find(|p| !p.in_bounds()) {
            Some(p) => Err(ConfigError::InvalidParameter {
                rule: name.to_string(),
                parameter: p.name,
                value: p.value,
                min: p.min,
                max: p.max,
            }),
            None => Ok(()),
        }
    }

    /// Side-effect-free applicability predicate
    fn is_applicable(&self, ctx: &RuleContext<'_>) -> bool;

    /// Compute the rule's effect for the year.
    ///
    /// Missing accounts and similar data problems are reported as a
    /// not-applied result, never as an error.
    fn apply(&self, ctx: &RuleContext<'_>) -> Result<RuleResult, RuleError>;
}

// ============================================================================
// Closed rule set
// ============================================================================

/// Tag naming one of the built-in rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    RothConversion,
    BackdoorRoth,
    MegaBackdoorRoth,
    Qcd,
    TaxLossHarvesting,
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::RothConversion,
        RuleKind::BackdoorRoth,
        RuleKind::MegaBackdoorRoth,
        RuleKind::Qcd,
        RuleKind::TaxLossHarvesting,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RuleKind::RothConversion => "roth_conversion",
            RuleKind::BackdoorRoth => "backdoor_roth",
            RuleKind::MegaBackdoorRoth => "mega_backdoor_roth",
            RuleKind::Qcd => "qcd",
            RuleKind::TaxLossHarvesting => "tax_loss_harvesting",
        }
    }

    /// Whether the plan's settings enable this rule
    #[must_use]
    pub fn is_enabled_in(self, settings: &StrategySettings) -> bool {
        match self {
            RuleKind::RothConversion => settings.roth_conversion.enabled,
            RuleKind::BackdoorRoth => settings.backdoor_roth.enabled,
            RuleKind::MegaBackdoorRoth => settings.mega_backdoor_roth.enabled,
            RuleKind::Qcd => settings.qcd.enabled,
            RuleKind::TaxLossHarvesting => settings.tax_loss_harvesting.enabled,
        }
    }

    /// Factory: the configured rule value for this tag
    #[must_use]
    pub fn build(self, settings: &StrategySettings) -> StrategyRule {
        match self {
            RuleKind::RothConversion => StrategyRule::RothConversion(RothConversionRule::new(
                settings.roth_conversion.clone(),
            )),
            RuleKind::BackdoorRoth => {
                StrategyRule::BackdoorRoth(BackdoorRothRule::new(settings.backdoor_roth.clone()))
            }
            RuleKind::MegaBackdoorRoth => StrategyRule::MegaBackdoorRoth(MegaBackdoorRothRule::new(
                settings.mega_backdoor_roth.clone(),
            )),
            RuleKind::Qcd => StrategyRule::Qcd(QcdRule::new(settings.qcd.clone())),
            RuleKind::TaxLossHarvesting => StrategyRule::TaxLossHarvesting(
                TaxLossHarvestingRule::new(settings.tax_loss_harvesting.clone()),
            ),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::UnknownRule(s.to_string()))
    }
}

/// A configured rule
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyRule {
    RothConversion(RothConversionRule),
    BackdoorRoth(BackdoorRothRule),
    MegaBackdoorRoth(MegaBackdoorRothRule),
    Qcd(QcdRule),
    TaxLossHarvesting(TaxLossHarvestingRule),
}

impl StrategyRule {
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            StrategyRule::RothConversion(_) => RuleKind::RothConversion,
            StrategyRule::BackdoorRoth(_) => RuleKind::BackdoorRoth,
            StrategyRule::MegaBackdoorRoth(_) => RuleKind::MegaBackdoorRoth,
            StrategyRule::Qcd(_) => RuleKind::Qcd,
            StrategyRule::TaxLossHarvesting(_) => RuleKind::TaxLossHarvesting,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn as_rule(&self) -> &dyn Rule {
        match self {
            StrategyRule::RothConversion(rule) => rule,
            StrategyRule::BackdoorRoth(rule) => rule,
            StrategyRule::MegaBackdoorRoth(rule) => rule,
            StrategyRule::Qcd(rule) => rule,
            StrategyRule::TaxLossHarvesting(rule) => rule,
        }
    }
}

impl Rule for StrategyRule {
    fn metadata(&self) -> RuleMetadata {
        self.as_rule().metadata()
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        self.as_rule().parameters()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.as_rule().validate()
    }

    fn is_applicable(&self, ctx: &RuleContext<'_>) -> bool {
        self.as_rule().is_applicable(ctx)
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Result<RuleResult, RuleError> {
        self.as_rule().apply(ctx)
    }
}

/// Build the rules for a list of tags.
///
/// Unknown tags are rejected here, before anything reaches the engine.
pub fn rules_from_tags<S: AsRef<str>>(
    tags: &[S],
    settings: &StrategySettings,
) -> Result<Vec<StrategyRule>, ConfigError> {
    tags.iter()
        .map(|tag| tag.as_ref().parse::<RuleKind>().map(|kind| kind.build(settings)))
        .collect()
}

/// Every rule the plan enables, in tag order
#[must_use]
pub fn enabled_rules(settings: &StrategySettings) -> Vec<StrategyRule> {
    RuleKind::ALL
        .into_iter()
        .filter(|kind| kind.is_enabled_in(settings))
        .map(|kind| kind.build(settings))
        .collect()
}
