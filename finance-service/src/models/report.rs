//! Aggregations over transactions.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryBreakdown {
    pub category_id: Option<Uuid>,
    pub category_name: String,
    pub color: Option<String>,
    pub total: Decimal,
    pub count: i64,
    #[sqlx(skip)]
    pub percentage: Decimal,
}

impl CategoryBreakdown {
    /// Fill each row's share of the grand total, two decimal places.
    pub fn with_percentages(mut rows: Vec<Self>) -> Vec<Self> {
        let grand_total: Decimal = rows.iter().map(|r| r.total).sum();
        for row in rows.iter_mut() {
            row.percentage = if grand_total.is_zero() {
                Decimal::ZERO
            } else {
                (row.total / grand_total * Decimal::ONE_HUNDRED).round_dp(2)
            };
        }
        rows
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEvolution {
    pub year: i32,
    pub month: u32,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

impl MonthlyEvolution {
    /// One entry per month for the `months` months ending with the month of
    /// `last`, oldest first. Months absent from `totals` are zeros.
    pub fn series(last: NaiveDate, months: u32, totals: &[(i32, u32, Decimal, Decimal)]) -> Vec<Self> {
        let Some(anchor) = NaiveDate::from_ymd_opt(last.year(), last.month(), 1) else {
            return Vec::new();
        };
        (0..months)
            .rev()
            .filter_map(|k| anchor.checked_sub_months(Months::new(k)))
            .map(|first| {
                let (year, month) = (first.year(), first.month());
                let (income, expense) = totals
                    .iter()
                    .find(|(y, m, _, _)| *y == year && *m == month)
                    .map(|(_, _, i, e)| (*i, *e))
                    .unwrap_or_default();
                Self {
                    year,
                    month,
                    income,
                    expense,
                    balance: income - expense,
                }
            })
            .collect()
    }
}
