//! Cross-module tests for the projection engine
//!
//! Tests are organized by topic:
//! - `rmd` - Uniform Lifetime Table, start ages and RMDs inside projections
//! - `projection` - Year-by-year mechanics: growth, spending, taxes, depletion
//! - `strategies` - Strategy rules running inside full projections
//! - `monte_carlo` - Scenario seeding, cancellation and aggregation
//! - `properties` - Proptest invariants

mod properties;
