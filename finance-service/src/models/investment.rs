//! Investment model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentType {
    FixedIncome,
    VariableIncome,
    Crypto,
    Other,
}

string_enum!(InvestmentType {
    FixedIncome => "fixed_income",
    VariableIncome => "variable_income",
    Crypto => "crypto",
    Other => "other",
});

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Investment {
    pub investment_id: Uuid,
    pub user_id: Uuid,
    pub investment_type: String,
    pub name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub user_id: Uuid,
    pub investment_type: InvestmentType,
    pub name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvestmentTypeTotal {
    pub investment_type: String,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestmentSummary {
    pub total: Decimal,
    pub by_type: Vec<InvestmentTypeTotal>,
}
