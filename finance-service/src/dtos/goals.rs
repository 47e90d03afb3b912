use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::double_option;
use crate::models::GoalStatus;

#[derive(Debug, Default, Deserialize)]
pub struct GoalQuery {
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGoalRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    #[validate(custom(function = "super::positive_amount"))]
    pub target_amount: Decimal,

    #[serde(default)]
    #[validate(custom(function = "super::non_negative_amount"))]
    pub current_amount: Decimal,

    pub target_date: Option<NaiveDate>,

    pub status: Option<GoalStatus>,

    #[validate(length(max = 80))]
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateGoalRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "super::positive_amount"))]
    pub target_amount: Option<Decimal>,

    #[validate(custom(function = "super::non_negative_amount"))]
    pub current_amount: Option<Decimal>,

    #[serde(default, deserialize_with = "double_option")]
    pub target_date: Option<Option<NaiveDate>>,

    pub status: Option<GoalStatus>,

    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContributeRequest {
    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Decimal,
}
