//! Services module for finance-service.

pub mod billing;
pub mod categorizer;
pub mod database;
pub mod insights;
pub mod metrics;
pub mod ofx;
pub mod providers;
pub mod recurrence;
pub mod scheduler;

pub use database::Database;
pub use insights::InsightGenerator;
pub use metrics::{get_metrics, init_metrics};
