use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::double_option;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]{3,30}$").expect("valid regex"));
static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid regex"));

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub username: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub display_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,

    #[validate(length(min = 2, max = 10, message = "locale must be 2-10 characters"))]
    pub locale: Option<String>,

    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,

    pub notify_budget_alerts: Option<bool>,
    pub notify_debt_reminders: Option<bool>,
    pub notify_insights: Option<bool>,
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username_format"))
    }
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if CURRENCY_RE.is_match(currency) {
        Ok(())
    } else {
        Err(ValidationError::new("currency_format"))
    }
}
