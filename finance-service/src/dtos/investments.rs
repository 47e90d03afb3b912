use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::double_option;
use crate::models::InvestmentType;

#[derive(Debug, Default, Deserialize)]
pub struct InvestmentQuery {
    pub investment_type: Option<InvestmentType>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvestmentRequest {
    pub investment_type: InvestmentType,

    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    #[validate(custom(function = "super::non_negative_amount"))]
    pub amount: Decimal,

    pub date: NaiveDate,

    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateInvestmentRequest {
    pub investment_type: Option<InvestmentType>,

    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "super::non_negative_amount"))]
    pub amount: Option<Decimal>,

    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}
