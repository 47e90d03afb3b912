use serde::Deserialize;
use validator::Validate;

use super::double_option;
use crate::models::CategoryType;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category_type: Option<CategoryType>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,

    pub category_type: CategoryType,

    #[validate(length(max = 20))]
    pub color: Option<String>,

    #[validate(length(max = 50))]
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: Option<String>,

    pub category_type: Option<CategoryType>,

    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
}
