//! Cached AI monthly report.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Insight {
    pub insight_id: Uuid,
    pub user_id: Uuid,
    pub month: i16,
    pub year: i32,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: i32,
    pub report: Json<InsightReport>,
    pub model: String,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub generation_ms: i64,
    pub created_utc: DateTime<Utc>,
}

/// Structured report as returned by the model, plus locally computed
/// category shares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub insights: Vec<InsightItem>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub top_categories: Vec<CategoryShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightItem {
    /// positive, negative, neutral or warning; free-form from the model.
    #[serde(default = "default_kind", alias = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

fn default_kind() -> String {
    "neutral".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub name: String,
    pub amount: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewInsight {
    pub user_id: Uuid,
    pub month: i16,
    pub year: i32,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: i32,
    pub report: InsightReport,
    pub model: String,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub generation_ms: i64,
}
