//! Account model, including credit-card invoice payments.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
    Other,
}

string_enum!(AccountType {
    Checking => "checking",
    Savings => "savings",
    CreditCard => "credit_card",
    Cash => "cash",
    Investment => "investment",
    Other => "other",
});

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub account_type: String,
    pub initial_balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub closing_day: Option<i16>,
    pub due_day: Option<i16>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Account {
    pub fn parsed_type(&self) -> Option<AccountType> {
        AccountType::parse(&self.account_type)
    }

    pub fn is_credit_card(&self) -> bool {
        self.parsed_type() == Some(AccountType::CreditCard)
    }

    /// Closing and due day of a credit card, when both are set.
    pub fn card_days(&self) -> Option<(u32, u32)> {
        match (self.closing_day, self.due_day) {
            (Some(closing), Some(due)) if self.is_credit_card() => {
                Some((closing as u32, due as u32))
            }
            _ => None,
        }
    }
}

/// Account plus its balance: initial balance, plus incomes, minus expenses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccountWithBalance {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub account: Account,
    pub current_balance: Decimal,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: Uuid,
    pub name: String,
    pub account_type: AccountType,
    pub initial_balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub closing_day: Option<i16>,
    pub due_day: Option<i16>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
}

/// Marks a billing period of a credit card as settled. No transaction is created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoicePayment {
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub paid_utc: DateTime<Utc>,
}
