//! Credit-card billing periods.
//!
//! A period runs from the day after the previous statement closing to the
//! current closing day. Closing and due days past the end of a short month
//! are clamped to its last day, so consecutive periods always tile the
//! calendar.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

/// Inclusive date range between two statement closings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Last day of the given month.
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
    let next = first + Months::new(1);
    next.pred_opt().expect("date has predecessor").day()
}

/// `day` in the month of `anchor`, clamped to the month's last day.
fn clamped_day(anchor: NaiveDate, day: u32) -> NaiveDate {
    let last = last_day_of_month(anchor.year(), anchor.month());
    NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), day.clamp(1, last))
        .expect("clamped day is valid")
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("day 1 is valid")
}

/// Closing date of the month containing `anchor`.
fn closing_in_month(anchor: NaiveDate, closing_day: u32) -> NaiveDate {
    clamped_day(anchor, closing_day)
}

/// Billing period that contains `reference`.
pub fn billing_period(closing_day: u32, reference: NaiveDate) -> BillingPeriod {
    let this_month = first_of_month(reference);
    let this_closing = closing_in_month(this_month, closing_day);

    let end_month = if reference <= this_closing {
        this_month
    } else {
        this_month + Months::new(1)
    };

    let end = closing_in_month(end_month, closing_day);
    let previous_closing = closing_in_month(end_month - Months::new(1), closing_day);
    let start = previous_closing
        .succ_opt()
        .expect("closing date has successor");

    BillingPeriod { start, end }
}

/// Period immediately before `period`.
pub fn previous_period(period: &BillingPeriod, closing_day: u32) -> BillingPeriod {
    let day_before = period.start.pred_opt().expect("date has predecessor");
    billing_period(closing_day, day_before)
}

/// Payment due date of a period. A due day after the closing day falls in
/// the closing month; otherwise it falls in the following month.
pub fn due_date(period: &BillingPeriod, closing_day: u32, due_day: u32) -> NaiveDate {
    let closing_month = first_of_month(period.end);
    let due_month = if due_day > closing_day {
        closing_month
    } else {
        closing_month + Months::new(1)
    };
    clamped_day(due_month, due_day)
}

/// The `count` most recent periods ending with the one containing
/// `reference`, newest first.
pub fn recent_periods(closing_day: u32, reference: NaiveDate, count: usize) -> Vec<BillingPeriod> {
    let mut periods = Vec::with_capacity(count);
    let mut current = billing_period(closing_day, reference);
    for _ in 0..count {
        periods.push(current);
        current = previous_period(&current, closing_day);
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn next_period(period: &BillingPeriod, closing_day: u32) -> BillingPeriod {
        billing_period(closing_day, period.end.succ_opt().unwrap())
    }

    #[test]
    fn reference_before_closing_ends_this_month() {
        let period = billing_period(10, d(2024, 3, 5));
        assert_eq!(period.start, d(2024, 2, 11));
        assert_eq!(period.end, d(2024, 3, 10));
    }

    #[test]
    fn reference_on_closing_day_belongs_to_closing_period() {
        let period = billing_period(10, d(2024, 3, 10));
        assert_eq!(period.end, d(2024, 3, 10));
    }

    #[test]
    fn reference_after_closing_rolls_to_next_month() {
        let period = billing_period(10, d(2024, 3, 11));
        assert_eq!(period.start, d(2024, 3, 11));
        assert_eq!(period.end, d(2024, 4, 10));
    }

    #[test]
    fn closing_day_31_clamps_in_short_months() {
        let feb_leap = billing_period(31, d(2024, 2, 15));
        assert_eq!(feb_leap.start, d(2024, 2, 1));
        assert_eq!(feb_leap.end, d(2024, 2, 29));

        let feb = billing_period(31, d(2023, 2, 15));
        assert_eq!(feb.end, d(2023, 2, 28));

        let march = billing_period(31, d(2023, 3, 1));
        assert_eq!(march.start, d(2023, 3, 1));
        assert_eq!(march.end, d(2023, 3, 31));

        let april = billing_period(31, d(2023, 4, 30));
        assert_eq!(april.end, d(2023, 4, 30));
    }

    #[test]
    fn closing_day_30_after_february() {
        let period = billing_period(30, d(2023, 3, 15));
        assert_eq!(period.start, d(2023, 3, 1));
        assert_eq!(period.end, d(2023, 3, 30));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let period = billing_period(5, d(2023, 12, 20));
        assert_eq!(period.start, d(2023, 12, 6));
        assert_eq!(period.end, d(2024, 1, 5));
    }

    #[test]
    fn consecutive_periods_tile_without_gaps() {
        for closing in [1, 15, 28, 29, 30, 31] {
            let mut period = billing_period(closing, d(2023, 1, 1));
            for _ in 0..30 {
                let next = next_period(&period, closing);
                assert_eq!(next.start, period.end.succ_opt().unwrap(), "closing {closing}");
                assert!(next.start <= next.end);
                period = next;
            }
        }
    }

    #[test]
    fn previous_period_is_adjacent() {
        let period = billing_period(20, d(2024, 5, 1));
        let prev = previous_period(&period, 20);
        assert_eq!(prev.end.succ_opt().unwrap(), period.start);
        assert_eq!(prev, billing_period(20, d(2024, 4, 1)));
    }

    #[test]
    fn due_day_after_closing_is_same_month() {
        let period = billing_period(5, d(2024, 3, 1));
        assert_eq!(due_date(&period, 5, 15), d(2024, 3, 15));
    }

    #[test]
    fn due_day_before_closing_is_next_month() {
        let period = billing_period(25, d(2024, 1, 10));
        assert_eq!(due_date(&period, 25, 5), d(2024, 2, 5));
    }

    #[test]
    fn due_day_is_clamped() {
        let period = billing_period(20, d(2024, 1, 10));
        assert_eq!(due_date(&period, 20, 31), d(2024, 1, 31));
        let period = billing_period(31, d(2024, 1, 10));
        assert_eq!(due_date(&period, 31, 30), d(2024, 2, 29));
    }

    #[test]
    fn recent_periods_walk_backwards() {
        let periods = recent_periods(10, d(2024, 3, 5), 3);
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].end, d(2024, 3, 10));
        assert_eq!(periods[1].end, d(2024, 2, 10));
        assert_eq!(periods[2].end, d(2024, 1, 10));
    }

    #[test]
    fn last_day_handles_leap_years() {
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2100, 2), 28);
        assert_eq!(last_day_of_month(2023, 12), 31);
    }
}
