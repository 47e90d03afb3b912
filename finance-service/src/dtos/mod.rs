pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod debts;
pub mod goals;
pub mod insights;
pub mod investments;
pub mod profiles;
pub mod transactions;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::ValidationError;

/// Distinguishes an absent PATCH field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default, deserialize_with = ...)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Money columns are NUMERIC(14,2); more precision would be rounded away.
fn check_cents(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > 2 {
        Err(ValidationError::new("amount_has_more_than_two_decimals"))
    } else {
        Ok(())
    }
}

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    check_cents(value)?;
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("amount_must_be_positive"))
    }
}

pub fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    check_cents(value)?;
    if value.is_sign_negative() && !value.is_zero() {
        Err(ValidationError::new("amount_must_not_be_negative"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        color: Option<Option<String>>,
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.color, None);

        let cleared: Patch = serde_json::from_str(r#"{"color": null}"#).unwrap();
        assert_eq!(cleared.color, Some(None));

        let set: Patch = serde_json::from_str(r##"{"color": "#fff"}"##).unwrap();
        assert_eq!(set.color, Some(Some("#fff".to_string())));
    }

    #[test]
    fn amount_validators() {
        assert!(positive_amount(&dec!(0.01)).is_ok());
        assert!(positive_amount(&Decimal::ZERO).is_err());
        assert!(non_negative_amount(&Decimal::ZERO).is_ok());
        assert!(non_negative_amount(&dec!(-1)).is_err());
    }

    #[test]
    fn amounts_are_limited_to_cents() {
        assert!(positive_amount(&dec!(0.004)).is_err());
        assert!(positive_amount(&dec!(10.005)).is_err());
        assert!(positive_amount(&dec!(10.500)).is_ok());
        assert!(non_negative_amount(&dec!(0.001)).is_err());
    }
}
