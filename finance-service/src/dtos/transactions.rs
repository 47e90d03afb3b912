use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use crate::models::TransactionType;
use crate::services::recurrence::DeleteScope;

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,

    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Decimal,

    pub transaction_type: TransactionType,

    #[serde(default)]
    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: String,

    pub date: NaiveDate,

    #[serde(default)]
    pub tags: Vec<String>,

    pub attachment_url: Option<String>,

    /// Split `amount` into this many monthly installments.
    #[validate(range(min = 2, max = 120, message = "installments must be between 2 and 120"))]
    pub installments: Option<u32>,

    /// Repeat `amount` for this many months.
    #[validate(range(min = 2, max = 120, message = "recurrence_count must be between 2 and 120"))]
    pub recurrence_count: Option<u32>,
}

/// Edits one row; group siblings are untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTransactionRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub account_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,

    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Option<Decimal>,

    pub transaction_type: Option<TransactionType>,

    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,

    pub date: Option<NaiveDate>,

    pub tags: Option<Vec<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub attachment_url: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteTransactionQuery {
    #[serde(default)]
    pub scope: DeleteScope,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ByCategoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct MonthlyEvolutionQuery {
    #[validate(range(min = 1, max = 24, message = "months must be between 1 and 24"))]
    pub months: Option<u32>,
}

/// One statement line offered for import.
#[derive(Debug, Serialize)]
pub struct ImportCandidate {
    pub fitid: Option<String>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
    pub suggested_category_id: Option<Uuid>,
    pub suggested_category_name: Option<String>,
    pub is_duplicate: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportPreviewResponse {
    pub transactions: Vec<ImportCandidate>,
    pub total: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ImportItem {
    pub date: NaiveDate,

    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Decimal,

    pub transaction_type: TransactionType,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,

    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmImportRequest {
    pub account_id: Option<Uuid>,

    #[validate(
        length(min = 1, max = 1000, message = "Provide between 1 and 1000 transactions"),
        nested
    )]
    pub transactions: Vec<ImportItem>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}
