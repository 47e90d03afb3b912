//! Debt model.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    Pending,
    Paid,
    Overdue,
}

string_enum!(DebtStatus {
    Pending => "pending",
    Paid => "paid",
    Overdue => "overdue",
});

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Debt {
    pub debt_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: String,
    pub amount_paid: Decimal,
    pub creditor: Option<String>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Debt {
    pub fn parsed_status(&self) -> Option<DebtStatus> {
        DebtStatus::parse(&self.status)
    }

    pub fn outstanding(&self) -> Decimal {
        (self.amount - self.amount_paid).max(Decimal::ZERO)
    }

    /// Settle the debt in full.
    pub fn mark_paid(&mut self) {
        self.amount_paid = self.amount;
        self.status = DebtStatus::Paid.as_str().to_string();
    }

    /// Register a partial payment; paying the remainder settles the debt.
    pub fn apply_payment(&mut self, payment: Decimal) {
        self.amount_paid = (self.amount_paid + payment).min(self.amount);
        if self.amount_paid >= self.amount {
            self.status = DebtStatus::Paid.as_str().to_string();
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewDebt {
    pub user_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: DebtStatus,
    pub amount_paid: Decimal,
    pub creditor: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DebtSummary {
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    pub count_by_status: BTreeMap<String, i64>,
}

impl DebtSummary {
    pub fn from_debts(debts: &[Debt]) -> Self {
        debts.iter().fold(Self::default(), |mut acc, debt| {
            let Some(status) = debt.parsed_status() else {
                return acc;
            };
            match status {
                DebtStatus::Pending => {
                    acc.total_pending += debt.amount;
                    acc.outstanding += debt.outstanding();
                }
                DebtStatus::Overdue => {
                    acc.total_overdue += debt.amount;
                    acc.outstanding += debt.outstanding();
                }
                DebtStatus::Paid => acc.total_paid += debt.amount,
            }
            *acc
                .count_by_status
                .entry(status.as_str().to_string())
                .or_insert(0) += 1;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn debt(amount: Decimal, status: DebtStatus) -> Debt {
        Debt {
            debt_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Cartão".to_string(),
            amount,
            due_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            status: status.as_str().to_string(),
            amount_paid: Decimal::ZERO,
            creditor: None,
            notes: None,
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        }
    }

    #[test]
    fn marking_paid_sets_amount_paid_to_amount() {
        let mut d = debt(dec!(350.75), DebtStatus::Overdue);
        d.mark_paid();
        assert_eq!(d.amount_paid, dec!(350.75));
        assert_eq!(d.parsed_status(), Some(DebtStatus::Paid));
    }

    #[test]
    fn partial_payments_settle_when_complete() {
        let mut d = debt(dec!(100), DebtStatus::Pending);
        d.apply_payment(dec!(40));
        assert_eq!(d.parsed_status(), Some(DebtStatus::Pending));
        assert_eq!(d.outstanding(), dec!(60));

        d.apply_payment(dec!(80));
        assert_eq!(d.amount_paid, dec!(100));
        assert_eq!(d.parsed_status(), Some(DebtStatus::Paid));
    }

    #[test]
    fn summary_groups_by_status() {
        let mut paid = debt(dec!(10), DebtStatus::Pending);
        paid.mark_paid();
        let debts = vec![
            debt(dec!(100), DebtStatus::Pending),
            debt(dec!(50), DebtStatus::Overdue),
            paid,
        ];
        let summary = DebtSummary::from_debts(&debts);
        assert_eq!(summary.total_pending, dec!(100));
        assert_eq!(summary.total_overdue, dec!(50));
        assert_eq!(summary.total_paid, dec!(10));
        assert_eq!(summary.outstanding, dec!(150));
        assert_eq!(summary.count_by_status["paid"], 1);
        assert_eq!(summary.count_by_status["pending"], 1);
        assert!(!summary.count_by_status.contains_key("unknown"));
    }
}
