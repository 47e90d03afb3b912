//! Monthly budget model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Budget for one month. A null `category_id` budgets the whole month.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Budget {
    pub budget_id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub amount: Decimal,
    pub month: i16,
    pub year: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BudgetWithSpending {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub budget: Budget,
    pub category_name: Option<String>,
    pub spent: Decimal,
    #[sqlx(skip)]
    pub remaining: Decimal,
    #[sqlx(skip)]
    pub percentage_used: Decimal,
}

impl BudgetWithSpending {
    /// Fill in `remaining` and `percentage_used` from `amount` and `spent`.
    pub fn with_totals(mut self) -> Self {
        self.remaining = self.budget.amount - self.spent;
        self.percentage_used = if self.budget.amount.is_zero() {
            Decimal::ZERO
        } else {
            (self.spent / self.budget.amount * Decimal::ONE_HUNDRED).round_dp(2)
        };
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub amount: Decimal,
    pub month: i16,
    pub year: i32,
}
