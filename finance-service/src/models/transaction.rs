//! Transaction model, including installment and recurring group membership.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

string_enum!(TransactionType {
    Income => "income",
    Expense => "expense",
});

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub amount: Decimal,
    pub transaction_type: String,
    pub description: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub attachment_url: Option<String>,
    pub installment_group_id: Option<Uuid>,
    pub installment_number: Option<i32>,
    pub total_installments: Option<i32>,
    pub recurring_group_id: Option<Uuid>,
    pub recurrence_number: Option<i32>,
    pub total_recurrences: Option<i32>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Transaction {
    pub fn parsed_type(&self) -> Option<TransactionType> {
        TransactionType::parse(&self.transaction_type)
    }

    /// Positive for income, negative for expense.
    pub fn signed_amount(&self) -> Decimal {
        match self.parsed_type() {
            Some(TransactionType::Income) => self.amount,
            Some(TransactionType::Expense) => -self.amount,
            None => Decimal::ZERO,
        }
    }
}

/// Position of a row inside an installment or recurring group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPosition {
    pub group_id: Uuid,
    pub number: i32,
    pub total: i32,
}

/// Input for inserting a transaction row.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub attachment_url: Option<String>,
    pub installment: Option<GroupPosition>,
    pub recurrence: Option<GroupPosition>,
}

/// Filter parameters for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
