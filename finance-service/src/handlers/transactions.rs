use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::transactions::{
    ByCategoryQuery, CreateTransactionRequest, DateRangeQuery, DeleteTransactionQuery,
    ListTransactionsQuery, MonthlyEvolutionQuery, UpdateTransactionRequest, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
use crate::dtos::DeletedResponse;
use crate::middleware::AuthUser;
use crate::models::{
    MonthlyEvolution, NewTransaction, TransactionFilter, TransactionType,
};
use crate::services::metrics::record_transactions_created;
use crate::services::recurrence::{expand_installments, expand_recurring};
use crate::startup::AppState;

const DEFAULT_EVOLUTION_MONTHS: u32 = 6;

/// 404 unless the referenced account and category belong to the user.
pub(crate) async fn check_ownership(
    state: &AppState,
    user_id: Uuid,
    account_id: Option<Uuid>,
    category_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(account_id) = account_id {
        state
            .db
            .get_account(user_id, account_id)
            .await?
            .ok_or_else(|| AppError::not_found("Account"))?;
    }
    if let Some(category_id) = category_id {
        state
            .db
            .get_category(user_id, category_id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;
    }
    Ok(())
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = TransactionFilter {
        start_date: params.start_date,
        end_date: params.end_date,
        transaction_type: params.transaction_type,
        category_id: params.category_id,
        account_id: params.account_id,
        search: params.search.filter(|s| !s.trim().is_empty()),
        limit: params
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
        offset: params.offset.unwrap_or(0).max(0),
    };

    let transactions = state.db.list_transactions(user.user_id, &filter).await?;
    Ok(Json(transactions))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    if req.installments.is_some() && req.recurrence_count.is_some() {
        return Err(AppError::bad_request(
            "installments and recurrence_count cannot be combined",
        ));
    }

    check_ownership(&state, user.user_id, req.account_id, req.category_id).await?;

    let template = NewTransaction {
        user_id: user.user_id,
        account_id: req.account_id,
        category_id: req.category_id,
        amount: req.amount,
        transaction_type: req.transaction_type,
        description: req.description.trim().to_string(),
        date: req.date,
        tags: req.tags,
        attachment_url: req.attachment_url,
        installment: None,
        recurrence: None,
    };

    let (kind, rows) = match (req.installments, req.recurrence_count) {
        (Some(n), _) => (
            "installment",
            expand_installments(&template, n).ok_or_else(|| {
                AppError::bad_request("amount is too small for the number of installments")
            })?,
        ),
        (_, Some(n)) => ("recurring", expand_recurring(&template, n)),
        _ => ("single", vec![template]),
    };

    let created = state.db.insert_transactions(&rows).await?;
    record_transactions_created(kind, created.len());

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .db
        .get_transaction(user.user_id, transaction_id)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction"))?;
    Ok(Json(transaction))
}

/// Edits one row; siblings in an installment or recurring group are untouched.
pub async fn update_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(req): Json<UpdateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut transaction = state
        .db
        .get_transaction(user.user_id, transaction_id)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction"))?;

    check_ownership(
        &state,
        user.user_id,
        req.account_id.flatten(),
        req.category_id.flatten(),
    )
    .await?;

    if let Some(account_id) = req.account_id {
        transaction.account_id = account_id;
    }
    if let Some(category_id) = req.category_id {
        transaction.category_id = category_id;
    }
    if let Some(amount) = req.amount {
        transaction.amount = amount;
    }
    if let Some(transaction_type) = req.transaction_type {
        transaction.transaction_type = transaction_type.as_str().to_string();
    }
    if let Some(description) = req.description {
        transaction.description = description.trim().to_string();
    }
    if let Some(date) = req.date {
        transaction.date = date;
    }
    if let Some(tags) = req.tags {
        transaction.tags = tags;
    }
    if let Some(attachment_url) = req.attachment_url {
        transaction.attachment_url = attachment_url;
    }

    let updated = state.db.update_transaction(&transaction).await?;
    Ok(Json(updated))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Query(params): Query<DeleteTransactionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .db
        .get_transaction(user.user_id, transaction_id)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction"))?;

    let deleted = state
        .db
        .delete_transaction(&transaction, params.scope)
        .await?;

    Ok(Json(DeletedResponse { deleted }))
}

pub async fn transaction_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state
        .db
        .transaction_summary(user.user_id, params.start_date, params.end_date)
        .await?;
    Ok(Json(summary))
}

pub async fn by_category(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ByCategoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state
        .db
        .category_breakdown(
            user.user_id,
            params.transaction_type.unwrap_or(TransactionType::Expense),
            params.start_date,
            params.end_date,
        )
        .await?;
    Ok(Json(rows))
}

pub async fn monthly_evolution(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<MonthlyEvolutionQuery>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let months = params.months.unwrap_or(DEFAULT_EVOLUTION_MONTHS);

    let today = Utc::now().date_naive();
    let (start, end) = evolution_window(today, months)
        .ok_or_else(|| AppError::bad_request("invalid months"))?;

    let totals: Vec<_> = state
        .db
        .monthly_totals(user.user_id, start, end)
        .await?
        .into_iter()
        .map(|t| (t.year, t.month as u32, t.income, t.expense))
        .collect();

    Ok(Json(MonthlyEvolution::series(today, months, &totals)))
}

/// First day of the oldest month through the last day of the current one.
fn evolution_window(today: NaiveDate, months: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
    let start = first.checked_sub_months(Months::new(months.saturating_sub(1)))?;
    let end = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn evolution_window_covers_whole_months() {
        let (start, end) = evolution_window(d(2024, 3, 15), 6).unwrap();
        assert_eq!(start, d(2023, 10, 1));
        assert_eq!(end, d(2024, 3, 31));
    }

    #[test]
    fn single_month_window() {
        let (start, end) = evolution_window(d(2024, 2, 10), 1).unwrap();
        assert_eq!(start, d(2024, 2, 1));
        assert_eq!(end, d(2024, 2, 29));
    }
}
