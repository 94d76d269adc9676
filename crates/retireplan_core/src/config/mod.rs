//! Plan construction
//!
//! Plans usually arrive as JSON (every model type is serde-ready). The builder
//! DSL here is the ergonomic route for code, tests and benches:
//!
//! ```ignore
//! use retireplan_core::config::{AccountBuilder, PlanBuilder};
//!
//! let plan = PlanBuilder::new()
//!     .ages(60, 65)
//!     .account(AccountBuilder::traditional_ira("IRA").balance(800_000))
//!     .account(AccountBuilder::roth_ira("Roth"))
//!     .retirement_spending(70_000)
//!     .build();
//! ```

pub mod account_builder;
pub mod builder;
pub mod cash_flow_builder;

pub use account_builder::AccountBuilder;
pub use builder::PlanBuilder;
pub use cash_flow_builder::{ExpenseBuilder, IncomeBuilder};
