//! AI-assisted monthly insights.
//!
//! A month of transactions is condensed into a [`MonthSnapshot`], sent to the
//! configured [`InsightProvider`] with a fixed Portuguese system prompt, and
//! the JSON answer is stored as the month's cached report.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{
    Category, CategoryShare, Insight, InsightReport, NewInsight, Transaction, TransactionSummary,
    TransactionType,
};
use crate::services::database::Database;
use crate::services::metrics::{record_error, record_insight_generation};
use crate::services::providers::{InsightProvider, ProviderError};

pub const UNCATEGORIZED: &str = "Sem categoria";

const TOP_CATEGORIES: usize = 5;
const TOP_EXPENSES: usize = 10;

pub const SYSTEM_PROMPT: &str = "Você é um consultor financeiro pessoal brasileiro. \
Analise os dados financeiros do mês informados pelo usuário e responda SOMENTE com um objeto JSON \
no formato: {\"summary\": string, \"insights\": [{\"type\": \"positive\" | \"negative\" | \"neutral\" | \"warning\", \
\"title\": string, \"description\": string}], \"recommendations\": [{\"title\": string, \"description\": string, \
\"priority\": \"high\" | \"medium\" | \"low\"}]}. \
Escreva em português do Brasil, seja objetivo, cite valores em reais e compare com o mês anterior quando houver dados. \
Gere entre 3 e 5 insights e entre 2 e 4 recomendações práticas.";

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("no transactions found for this period")]
    NoTransactions,

    #[error("invalid period")]
    InvalidPeriod,

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("invalid model response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

impl IntoResponse for InsightError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            InsightError::App(err) => return err.into_response(),
            InsightError::NoTransactions | InsightError::InvalidPeriod => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            InsightError::Provider(ProviderError::RateLimited) => (
                StatusCode::TOO_MANY_REQUESTS,
                "AI service is busy, please try again in a few minutes".to_string(),
            ),
            InsightError::Provider(ref err) => {
                tracing::error!(error = %err, "Insight provider failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate insights".to_string(),
                )
            }
            InsightError::InvalidResponse(ref err) => {
                tracing::error!(error = %err, "Unparsable insight response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate insights".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// First and last day of a calendar month.
pub fn month_range(month: u32, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((start, end))
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseLine {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviousMonth {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub income_change_pct: Option<Decimal>,
    pub expense_change_pct: Option<Decimal>,
}

/// Figures sent to the model for one month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthSnapshot {
    pub month: u32,
    pub year: i32,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
    pub top_categories: Vec<CategoryShare>,
    pub top_expenses: Vec<ExpenseLine>,
    pub previous_month: Option<PreviousMonth>,
}

fn change_pct(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        None
    } else {
        Some(((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(1))
    }
}

impl MonthSnapshot {
    pub fn build(
        month: u32,
        year: i32,
        transactions: &[Transaction],
        categories: &[Category],
        previous: &TransactionSummary,
    ) -> Self {
        let names: HashMap<Uuid, &str> = categories
            .iter()
            .map(|c| (c.category_id, c.name.as_str()))
            .collect();
        let category_name = |id: Option<Uuid>| {
            id.and_then(|id| names.get(&id).copied())
                .unwrap_or(UNCATEGORIZED)
                .to_string()
        };

        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        let mut by_category: HashMap<String, Decimal> = HashMap::new();
        let mut expenses: Vec<&Transaction> = Vec::new();

        for tx in transactions {
            match tx.parsed_type() {
                Some(TransactionType::Income) => total_income += tx.amount,
                Some(TransactionType::Expense) => {
                    total_expense += tx.amount;
                    *by_category.entry(category_name(tx.category_id)).or_default() += tx.amount;
                    expenses.push(tx);
                }
                None => {}
            }
        }

        let mut top_categories: Vec<CategoryShare> = by_category
            .into_iter()
            .map(|(name, amount)| CategoryShare {
                percentage: if total_expense.is_zero() {
                    Decimal::ZERO
                } else {
                    (amount / total_expense * Decimal::ONE_HUNDRED).round_dp(2)
                },
                name,
                amount,
            })
            .collect();
        top_categories.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
        top_categories.truncate(TOP_CATEGORIES);

        expenses.sort_by(|a, b| b.amount.cmp(&a.amount));
        let top_expenses = expenses
            .into_iter()
            .take(TOP_EXPENSES)
            .map(|tx| ExpenseLine {
                date: tx.date,
                description: tx.description.clone(),
                amount: tx.amount,
                category: category_name(tx.category_id),
            })
            .collect();

        let previous_month = (previous.transaction_count > 0).then(|| PreviousMonth {
            total_income: previous.total_income,
            total_expense: previous.total_expense,
            balance: previous.balance,
            income_change_pct: change_pct(total_income, previous.total_income),
            expense_change_pct: change_pct(total_expense, previous.total_expense),
        });

        Self {
            month,
            year,
            total_income,
            total_expense,
            balance: total_income - total_expense,
            transaction_count: transactions.len(),
            top_categories,
            top_expenses,
            previous_month,
        }
    }

    pub fn user_prompt(&self) -> Result<String, serde_json::Error> {
        Ok(format!(
            "Dados financeiros de {:02}/{}:\n{}",
            self.month,
            self.year,
            serde_json::to_string_pretty(self)?
        ))
    }
}

/// Parse the model's JSON answer. Markdown code fences are tolerated.
pub fn parse_report(
    text: &str,
    top_categories: Vec<CategoryShare>,
) -> Result<InsightReport, serde_json::Error> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    let mut report: InsightReport = serde_json::from_str(body.trim())?;
    report.top_categories = top_categories;
    Ok(report)
}

/// Builds and caches monthly reports.
#[derive(Clone)]
pub struct InsightGenerator {
    db: Database,
    provider: Arc<dyn InsightProvider>,
}

impl InsightGenerator {
    pub fn new(db: Database, provider: Arc<dyn InsightProvider>) -> Self {
        Self { db, provider }
    }

    /// Return the cached report for the month unless `force` is set;
    /// otherwise ask the provider and replace the cache row.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        user_id: Uuid,
        month: u32,
        year: i32,
        force: bool,
    ) -> Result<Insight, InsightError> {
        let (start, end) = month_range(month, year).ok_or(InsightError::InvalidPeriod)?;

        if !force {
            if let Some(cached) = self
                .db
                .get_insight_for_period(user_id, month as i16, year)
                .await?
            {
                record_insight_generation("cached");
                return Ok(cached);
            }
        }

        let transactions = self.db.transactions_between(user_id, None, start, end).await?;
        if transactions.is_empty() {
            return Err(InsightError::NoTransactions);
        }

        let categories = self.db.list_categories(user_id, None).await?;
        let previous_start = start
            .checked_sub_months(Months::new(1))
            .ok_or(InsightError::InvalidPeriod)?;
        let previous_end = start.pred_opt().ok_or(InsightError::InvalidPeriod)?;
        let previous = self
            .db
            .transaction_summary(user_id, Some(previous_start), Some(previous_end))
            .await?;

        let snapshot = MonthSnapshot::build(
            start.month(),
            start.year(),
            &transactions,
            &categories,
            &previous,
        );
        let prompt = snapshot.user_prompt()?;

        let started = Instant::now();
        let response = match self.provider.complete_json(SYSTEM_PROMPT, &prompt).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Insight provider request failed");
                record_insight_generation("failed");
                record_error("insight_provider");
                return Err(err.into());
            }
        };
        let generation_ms = started.elapsed().as_millis() as i64;

        let report = parse_report(&response.text, snapshot.top_categories.clone()).map_err(|e| {
            record_insight_generation("failed");
            record_error("insight_parse");
            InsightError::from(e)
        })?;

        let stored = self
            .db
            .upsert_insight(&NewInsight {
                user_id,
                month: month as i16,
                year,
                total_income: snapshot.total_income,
                total_expense: snapshot.total_expense,
                balance: snapshot.balance,
                transaction_count: snapshot.transaction_count as i32,
                report,
                model: response.model,
                prompt_tokens: response.prompt_tokens,
                completion_tokens: response.completion_tokens,
                generation_ms,
            })
            .await?;

        record_insight_generation("generated");
        info!(
            insight_id = %stored.insight_id,
            generation_ms = generation_ms,
            "Monthly insight generated"
        );

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn tx(kind: TransactionType, amount: Decimal, category_id: Option<Uuid>, description: &str) -> Transaction {
        Transaction {
            transaction_id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            account_id: None,
            category_id,
            amount,
            transaction_type: kind.as_str().to_string(),
            description: description.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            tags: vec![],
            attachment_url: None,
            installment_group_id: None,
            installment_number: None,
            total_installments: None,
            recurring_group_id: None,
            recurrence_number: None,
            total_recurrences: None,
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        }
    }

    fn category(id: Uuid, name: &str) -> Category {
        Category {
            category_id: id,
            user_id: Uuid::nil(),
            name: name.to_string(),
            category_type: "expense".to_string(),
            color: None,
            icon: None,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn month_range_covers_whole_month() {
        let (start, end) = month_range(2, 2024).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(month_range(13, 2024).is_none());
    }

    #[test]
    fn snapshot_totals_and_shares() {
        let food = Uuid::new_v4();
        let transactions = vec![
            tx(TransactionType::Income, dec!(5000), None, "Salário"),
            tx(TransactionType::Expense, dec!(300), Some(food), "Mercado"),
            tx(TransactionType::Expense, dec!(100), None, "Diversos"),
        ];
        let previous = TransactionSummary {
            total_income: dec!(4000),
            total_expense: dec!(800),
            balance: dec!(3200),
            transaction_count: 5,
        };

        let snapshot = MonthSnapshot::build(
            3,
            2024,
            &transactions,
            &[category(food, "Alimentação")],
            &previous,
        );

        assert_eq!(snapshot.total_income, dec!(5000));
        assert_eq!(snapshot.total_expense, dec!(400));
        assert_eq!(snapshot.balance, dec!(4600));
        assert_eq!(snapshot.transaction_count, 3);
        assert_eq!(snapshot.top_categories[0].name, "Alimentação");
        assert_eq!(snapshot.top_categories[0].percentage, dec!(75));
        assert_eq!(snapshot.top_categories[1].name, UNCATEGORIZED);
        assert_eq!(snapshot.top_expenses[0].description, "Mercado");

        let prev = snapshot.previous_month.unwrap();
        assert_eq!(prev.income_change_pct, Some(dec!(25)));
        assert_eq!(prev.expense_change_pct, Some(dec!(-50)));
    }

    #[test]
    fn empty_previous_month_is_omitted() {
        let transactions = vec![tx(TransactionType::Expense, dec!(10), None, "Café")];
        let snapshot = MonthSnapshot::build(3, 2024, &transactions, &[], &TransactionSummary::default());
        assert!(snapshot.previous_month.is_none());
        assert!(snapshot.user_prompt().unwrap().starts_with("Dados financeiros de 03/2024"));
    }

    #[test]
    fn top_lists_are_truncated() {
        let transactions: Vec<_> = (1..=12)
            .map(|i| {
                tx(
                    TransactionType::Expense,
                    Decimal::from(i),
                    Some(Uuid::new_v4()),
                    "x",
                )
            })
            .collect();
        let snapshot = MonthSnapshot::build(3, 2024, &transactions, &[], &TransactionSummary::default());
        assert_eq!(snapshot.top_expenses.len(), 10);
        assert_eq!(snapshot.top_expenses[0].amount, dec!(12));
        // unknown category ids collapse into a single uncategorised bucket
        assert_eq!(snapshot.top_categories.len(), 1);
    }

    #[test]
    fn parses_report_and_attaches_categories() {
        let text = r#"```json
{"summary": "Mês equilibrado", "insights": [{"type": "positive", "title": "Saldo positivo", "description": "..."}],
 "recommendations": [{"title": "Reserva", "description": "Guarde 10%"}]}
```"#;
        let shares = vec![CategoryShare {
            name: "Alimentação".to_string(),
            amount: dec!(300),
            percentage: dec!(75),
        }];
        let report = parse_report(text, shares.clone()).unwrap();
        assert_eq!(report.summary, "Mês equilibrado");
        assert_eq!(report.insights[0].kind, "positive");
        assert_eq!(report.recommendations[0].priority, "medium");
        assert_eq!(report.top_categories, shares);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_report("not json", vec![]).is_err());
    }

    #[test]
    fn rate_limited_provider_maps_to_429() {
        let res = InsightError::Provider(ProviderError::RateLimited).into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let res = InsightError::Provider(ProviderError::ApiError("x".into())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let res = InsightError::NoTransactions.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
