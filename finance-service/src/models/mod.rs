//! Domain models for finance-service.
//!
//! Row structs keep enum-like columns as `String`, the way they are stored;
//! the typed enums carry the allowed values for request validation.

/// Generates `as_str`, `parse` and `Display` for a string-backed enum.
macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            /// Get string representation for database.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($s => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

mod account;
mod budget;
mod category;
mod debt;
mod goal;
mod insight;
mod investment;
mod profile;
mod report;
mod transaction;

pub use account::{Account, AccountType, AccountWithBalance, InvoicePayment, NewAccount};
pub use budget::{Budget, BudgetWithSpending, NewBudget};
pub use category::{Category, CategoryType, NewCategory};
pub use debt::{Debt, DebtStatus, DebtSummary, NewDebt};
pub use goal::{Goal, GoalStatus, NewGoal};
pub use insight::{
    CategoryShare, Insight, InsightItem, InsightReport, NewInsight, Recommendation,
};
pub use investment::{Investment, InvestmentSummary, InvestmentType, InvestmentTypeTotal, NewInvestment};
pub use profile::Profile;
pub use report::{CategoryBreakdown, MonthlyEvolution, TransactionSummary};
pub use transaction::{
    GroupPosition, NewTransaction, Transaction, TransactionFilter, TransactionType,
};
