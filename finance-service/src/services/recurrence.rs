//! Expansion of installment and recurring purchases into monthly rows, and
//! the scopes for deleting grouped rows.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{GroupPosition, NewTransaction};

/// Which rows of a group a delete touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteScope {
    #[default]
    Single,
    All,
    Future,
}

/// `k` months after `start`, clamping the day (Jan 31 + 1 month = Feb 28/29).
/// Always computed from the original date so that short months never shift
/// later occurrences.
pub fn month_offset(start: NaiveDate, k: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(k))
        .unwrap_or(NaiveDate::MAX)
}

/// Split `total` into `n` two-decimal parts that add up to `total`. The
/// leftover cents go one each to the first parts. `None` when a part would
/// be less than one cent.
pub fn split_amount(total: Decimal, n: u32) -> Option<Vec<Decimal>> {
    if n == 0 {
        return None;
    }
    let cents = (total * Decimal::ONE_HUNDRED).trunc();
    let count = Decimal::from(n);
    let base = (cents / count).floor();
    if base <= Decimal::ZERO {
        return None;
    }
    let extra = cents - base * count;

    let parts = (0..n)
        .map(|i| {
            let share = if Decimal::from(i) < extra {
                base + Decimal::ONE
            } else {
                base
            };
            share / Decimal::ONE_HUNDRED
        })
        .collect();
    Some(parts)
}

/// One purchase of `template.amount` paid in `n` monthly installments.
/// Descriptions get a ` (k/n)` suffix. `None` when the amount cannot cover
/// one cent per installment.
pub fn expand_installments(template: &NewTransaction, n: u32) -> Option<Vec<NewTransaction>> {
    let group_id = Uuid::new_v4();
    let rows = split_amount(template.amount, n)?
        .into_iter()
        .enumerate()
        .map(|(i, amount)| {
            let k = i as u32;
            let mut row = template.clone();
            row.amount = amount;
            row.date = month_offset(template.date, k);
            row.description = format!("{} ({}/{})", template.description, k + 1, n);
            row.installment = Some(GroupPosition {
                group_id,
                number: (k + 1) as i32,
                total: n as i32,
            });
            row.recurrence = None;
            row
        })
        .collect();
    Some(rows)
}

/// The same amount repeated for `n` consecutive months.
pub fn expand_recurring(template: &NewTransaction, n: u32) -> Vec<NewTransaction> {
    let group_id = Uuid::new_v4();
    (0..n)
        .map(|k| {
            let mut row = template.clone();
            row.date = month_offset(template.date, k);
            row.recurrence = Some(GroupPosition {
                group_id,
                number: (k + 1) as i32,
                total: n as i32,
            });
            row.installment = None;
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use rust_decimal_macros::dec;

    fn template(amount: Decimal, date: NaiveDate) -> NewTransaction {
        NewTransaction {
            user_id: Uuid::new_v4(),
            account_id: None,
            category_id: None,
            amount,
            transaction_type: TransactionType::Expense,
            description: "Notebook".to_string(),
            date,
            tags: vec![],
            attachment_url: None,
            installment: None,
            recurrence: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn split_keeps_total_exact() {
        let parts = split_amount(dec!(100), 3).unwrap();
        assert_eq!(parts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
        assert_eq!(parts.iter().copied().sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn split_even_amount() {
        assert_eq!(split_amount(dec!(300), 3).unwrap(), vec![dec!(100); 3]);
    }

    #[test]
    fn split_spreads_cents_without_negative_parts() {
        let parts = split_amount(dec!(1.00), 120);
        assert!(parts.is_none());

        let parts = split_amount(dec!(1.99), 120).unwrap();
        assert_eq!(parts.len(), 120);
        assert!(parts.iter().all(|p| *p > Decimal::ZERO));
        assert_eq!(parts.iter().copied().sum::<Decimal>(), dec!(1.99));

        let parts = split_amount(dec!(10.00), 3).unwrap();
        assert!(parts.iter().all(|p| *p >= dec!(3.33)));
        assert_eq!(parts.iter().copied().sum::<Decimal>(), dec!(10.00));
    }

    #[test]
    fn split_below_one_cent_per_part_is_rejected() {
        assert!(split_amount(dec!(0.05), 10).is_none());
        assert_eq!(split_amount(dec!(0.10), 10).unwrap(), vec![dec!(0.01); 10]);
        assert!(split_amount(dec!(50), 0).is_none());
    }

    #[test]
    fn installments_too_small_yield_nothing() {
        assert!(expand_installments(&template(dec!(1.00), d(2024, 1, 1)), 120).is_none());
    }

    #[test]
    fn installments_share_group_and_number_sequentially() {
        let rows = expand_installments(&template(dec!(1200), d(2024, 1, 15)), 12).unwrap();
        assert_eq!(rows.len(), 12);

        let group = rows[0].installment.unwrap().group_id;
        for (i, row) in rows.iter().enumerate() {
            let pos = row.installment.unwrap();
            assert_eq!(pos.group_id, group);
            assert_eq!(pos.number, i as i32 + 1);
            assert_eq!(pos.total, 12);
            assert_eq!(row.amount, dec!(100));
            assert!(row.recurrence.is_none());
        }
        assert_eq!(rows[0].description, "Notebook (1/12)");
        assert_eq!(rows[11].date, d(2024, 12, 15));
    }

    #[test]
    fn month_end_dates_clamp_without_drift() {
        let rows = expand_recurring(&template(dec!(50), d(2024, 1, 31)), 4);
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31), d(2024, 4, 30)]
        );
    }

    #[test]
    fn recurring_repeats_full_amount() {
        let rows = expand_recurring(&template(dec!(39.90), d(2024, 5, 1)), 3);
        assert!(rows.iter().all(|r| r.amount == dec!(39.90)));
        assert!(rows.iter().all(|r| r.description == "Notebook"));
        let numbers: Vec<_> = rows.iter().map(|r| r.recurrence.unwrap().number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn delete_scope_defaults_to_single() {
        assert_eq!(DeleteScope::default(), DeleteScope::Single);
    }
}
