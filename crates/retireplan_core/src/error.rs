//! Error types
//!
//! Configuration problems are fatal and surface before any year is projected.
//! Per-rule runtime failures are isolated by the rule engine and recorded next
//! to the results. Missing accounts or ineligible situations are not errors at
//! all: rules report them as a non-application reason.

use thiserror::Error;

/// Rule name plus the dependencies it is missing from the enabled set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    pub rule: String,
    pub missing: Vec<String>,
}

/// Errors that abort initialization before any year is simulated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("rule `{0}` is already registered")]
    DuplicateRule(String),

    #[error("rule `{name}` is invalid: {reason}")]
    InvalidRule { name: String, reason: &'static str },

    #[error("missing rule dependencies: {}", format_missing(.0))]
    MissingDependencies(Vec<MissingDependency>),

    #[error("circular dependency detected at rule `{0}`")]
    CircularDependency(String),

    #[error("parameter `{parameter}` of rule `{rule}` is {value}, expected {min}..={max}")]
    InvalidParameter {
        rule: String,
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown rule `{0}`")]
    UnknownRule(String),
}

fn format_missing(missing: &[MissingDependency]) -> String {
    missing
        .iter()
        .map(|m| format!("{} needs [{}]", m.rule, m.missing.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure inside a single rule's `apply`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("account index {0} is out of range")]
    AccountOutOfRange(usize),

    #[error("no {table} bracket is taxed at {rate}")]
    BracketNotFound { table: &'static str, rate: f64 },

    #[error("non-finite value computed for {0}")]
    NonFinite(&'static str),
}

/// Errors from the Monte Carlo driver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonteCarloError {
    #[error("invalid {distribution} parameters (mean={mean}, std_dev={std_dev})")]
    InvalidDistribution {
        distribution: &'static str,
        mean: f64,
        std_dev: f64,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Run was cancelled between scenarios
    #[error("monte carlo run cancelled")]
    Cancelled,
}
