use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use crate::models::{AccountType, Transaction};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    pub account_type: AccountType,

    #[serde(default)]
    pub initial_balance: Decimal,

    #[validate(custom(function = "super::non_negative_amount"))]
    pub credit_limit: Option<Decimal>,

    #[validate(range(min = 1, max = 31, message = "closing_day must be between 1 and 31"))]
    pub closing_day: Option<i16>,

    #[validate(range(min = 1, max = 31, message = "due_day must be between 1 and 31"))]
    pub due_day: Option<i16>,

    #[validate(length(max = 20))]
    pub color: Option<String>,

    #[validate(length(max = 50))]
    pub icon: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,

    pub account_type: Option<AccountType>,

    pub initial_balance: Option<Decimal>,

    #[serde(default, deserialize_with = "double_option")]
    pub credit_limit: Option<Option<Decimal>>,

    #[serde(default, deserialize_with = "double_option")]
    pub closing_day: Option<Option<i16>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_day: Option<Option<i16>>,

    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAccountsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceQuery {
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct InvoiceHistoryQuery {
    #[validate(range(min = 1, max = 24, message = "months must be between 1 and 24"))]
    pub months: Option<u32>,
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayInvoiceRequest {
    pub reference_date: Option<NaiveDate>,
}

/// Credit-card statement for one billing period.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub account_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    /// Expenses minus incomes (refunds) in the period.
    pub total: Decimal,
    pub is_paid: bool,
    pub paid_utc: Option<DateTime<Utc>>,
    pub transactions: Vec<Transaction>,
}
