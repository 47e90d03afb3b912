pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod debts;
pub mod goals;
pub mod health;
pub mod imports;
pub mod insights;
pub mod investments;
pub mod profiles;
pub mod transactions;

pub use health::{health_check, metrics_handler, readiness_check};
