//! Savings goal model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Cancelled,
}

string_enum!(GoalStatus {
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Goal {
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: Option<NaiveDate>,
    pub status: String,
    pub category: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Goal {
    pub fn parsed_status(&self) -> Option<GoalStatus> {
        GoalStatus::parse(&self.status)
    }

    /// Add a contribution. An active goal that reaches its target completes.
    pub fn contribute(&mut self, amount: Decimal) {
        self.current_amount += amount;
        if self.parsed_status() == Some(GoalStatus::Active)
            && self.current_amount >= self.target_amount
        {
            self.status = GoalStatus::Completed.as_str().to_string();
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub user_id: Uuid,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub category: Option<String>,
}
