use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::double_option;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct BudgetQuery {
    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    pub month: Option<i16>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBudgetRequest {
    /// `None` budgets every expense of the month.
    pub category_id: Option<Uuid>,

    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Decimal,

    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    pub month: i16,

    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBudgetRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,

    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Option<Decimal>,

    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    pub month: Option<i16>,

    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: Option<i32>,
}
