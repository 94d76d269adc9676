mod accounts;
mod ids;
mod limits;
mod market;
mod money;
mod plan;
mod results;
mod rmd;
mod state;
mod strategies;
mod tax_config;

pub use accounts::{Account, AccountKind, TaxCharacter};
pub use ids::{AccountId, ExpenseId, IncomeId};
pub use limits::ContributionLimits;
pub use market::{MarketPath, ReturnAssumption};
pub use money::Cents;
pub use plan::{
    Assumptions, DEFAULT_START_YEAR, Expense, Income, IncomeKind, Plan, SocialSecurity,
    WithdrawalStrategy,
};
pub use results::{
    AccountYear, BalanceModification, MonteCarloSummary, PercentileBands, ProjectionOutcome,
    RuleErrorEntry, RuleOutputs, RuleResult, ScenarioOutcome, SequenceRiskReport,
    SimulationResult, SkippedRule, TaxEffects, TaxImpact, YearRuleReport,
};
pub use rmd::{RmdTable, RmdTableEntry, rmd_start_age_for_birth_year};
pub use state::{ProjectionPhase, ProjectionState, RunningTotals, YearMetadata};
pub use strategies::{
    BACKDOOR_INCOME_CEILING, BackdoorRothSettings, ConversionStrategy, HarvestStrategy, MegaBackdoorRothSettings,
    QcdSettings, QcdStrategy, RothConversionSettings, StrategySettings,
    TaxLossHarvestingSettings,
};
pub use tax_config::{
    FicaConfig, FilingStatus, JurisdictionTax, TaxBracket, TaxProfile, bracket_table,
};
