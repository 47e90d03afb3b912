use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::double_option;
use crate::models::DebtStatus;

#[derive(Debug, Default, Deserialize)]
pub struct DebtQuery {
    pub status: Option<DebtStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDebtRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Decimal,

    pub due_date: NaiveDate,

    pub status: Option<DebtStatus>,

    #[serde(default)]
    #[validate(custom(function = "super::non_negative_amount"))]
    pub amount_paid: Decimal,

    #[validate(length(max = 120))]
    pub creditor: Option<String>,

    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDebtRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Option<Decimal>,

    pub due_date: Option<NaiveDate>,

    pub status: Option<DebtStatus>,

    #[validate(custom(function = "super::non_negative_amount"))]
    pub amount_paid: Option<Decimal>,

    #[serde(default, deserialize_with = "double_option")]
    pub creditor: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DebtPaymentRequest {
    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Decimal,
}
