//! Category model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
    Investment,
}

string_enum!(CategoryType {
    Income => "income",
    Expense => "expense",
    Investment => "investment",
});

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category_type: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub user_id: Uuid,
    pub name: String,
    pub category_type: CategoryType,
    pub color: Option<String>,
    pub icon: Option<String>,
}
