use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::accounts::{
    CreateAccountRequest, InvoiceHistoryQuery, InvoiceQuery, InvoiceResponse, ListAccountsQuery,
    PayInvoiceRequest, UpdateAccountRequest,
};
use crate::middleware::AuthUser;
use crate::models::{Account, AccountType, NewAccount};
use crate::services::billing::{self, BillingPeriod};
use crate::startup::AppState;

const DEFAULT_INVOICE_MONTHS: u32 = 6;

/// A credit card needs both days, each in 1..=31.
fn check_card_days(
    account_type: AccountType,
    closing_day: Option<i16>,
    due_day: Option<i16>,
) -> Result<(), AppError> {
    let in_range = |d: Option<i16>| d.map_or(true, |d| (1..=31).contains(&d));
    if !in_range(closing_day) || !in_range(due_day) {
        return Err(AppError::bad_request("closing_day and due_day must be between 1 and 31"));
    }
    if account_type == AccountType::CreditCard && (closing_day.is_none() || due_day.is_none()) {
        return Err(AppError::bad_request(
            "credit card accounts require closing_day and due_day",
        ));
    }
    Ok(())
}

pub async fn list_accounts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListAccountsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let accounts = state
        .db
        .list_accounts(user.user_id, params.include_inactive)
        .await?;
    Ok(Json(accounts))
}

pub async fn create_account(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    check_card_days(req.account_type, req.closing_day, req.due_day)?;

    let account = state
        .db
        .create_account(&NewAccount {
            user_id: user.user_id,
            name: req.name.trim().to_string(),
            account_type: req.account_type,
            initial_balance: req.initial_balance,
            credit_limit: req.credit_limit,
            closing_day: req.closing_day,
            due_day: req.due_day,
            color: req.color,
            icon: req.icon,
            is_active: req.is_active.unwrap_or(true),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .db
        .get_account_with_balance(user.user_id, account_id)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;
    Ok(Json(account))
}

pub async fn update_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<Uuid>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut account = load_account(&state, user.user_id, account_id).await?;

    if let Some(name) = req.name {
        account.name = name.trim().to_string();
    }
    if let Some(account_type) = req.account_type {
        account.account_type = account_type.as_str().to_string();
    }
    if let Some(initial_balance) = req.initial_balance {
        account.initial_balance = initial_balance;
    }
    if let Some(credit_limit) = req.credit_limit {
        account.credit_limit = credit_limit;
    }
    if let Some(closing_day) = req.closing_day {
        account.closing_day = closing_day;
    }
    if let Some(due_day) = req.due_day {
        account.due_day = due_day;
    }
    if let Some(color) = req.color {
        account.color = color;
    }
    if let Some(icon) = req.icon {
        account.icon = icon;
    }
    if let Some(is_active) = req.is_active {
        account.is_active = is_active;
    }

    let account_type = account
        .parsed_type()
        .ok_or_else(|| AppError::bad_request("invalid account type"))?;
    check_card_days(account_type, account.closing_day, account.due_day)?;

    state.db.update_account(&account).await?;
    let updated = state
        .db
        .get_account_with_balance(user.user_id, account_id)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    Ok(Json(updated))
}

pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_account(user.user_id, account_id).await? {
        return Err(AppError::not_found("Account"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Credit-card invoices
// =========================================================================

async fn load_account(state: &AppState, user_id: Uuid, account_id: Uuid) -> Result<Account, AppError> {
    state
        .db
        .get_account(user_id, account_id)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))
}

/// Closing and due day of a credit-card account, or 400.
async fn load_card(
    state: &AppState,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<(Account, u32, u32), AppError> {
    let account = load_account(state, user_id, account_id).await?;
    if !account.is_credit_card() {
        return Err(AppError::bad_request("account is not a credit card"));
    }
    let (closing_day, due_day) = account
        .card_days()
        .ok_or_else(|| AppError::bad_request("credit card has no closing_day or due_day"))?;
    Ok((account, closing_day, due_day))
}

async fn build_invoice(
    state: &AppState,
    account: &Account,
    period: BillingPeriod,
    closing_day: u32,
    due_day: u32,
) -> Result<InvoiceResponse, AppError> {
    let transactions = state
        .db
        .transactions_between(account.user_id, Some(account.account_id), period.start, period.end)
        .await?;
    let total: Decimal = transactions.iter().map(|t| -t.signed_amount()).sum();
    let payment = state.db.get_invoice_payment(account.account_id, period).await?;

    Ok(InvoiceResponse {
        account_id: account.account_id,
        period_start: period.start,
        period_end: period.end,
        due_date: billing::due_date(&period, closing_day, due_day),
        total,
        is_paid: payment.is_some(),
        paid_utc: payment.map(|p| p.paid_utc),
        transactions,
    })
}

/// The requested reference date, or today. Years are bounded so period
/// arithmetic stays inside chrono's calendar.
fn reference_date(requested: Option<NaiveDate>) -> Result<NaiveDate, AppError> {
    let date = requested.unwrap_or_else(|| Utc::now().date_naive());
    if !(1900..=9999).contains(&date.year()) {
        return Err(AppError::bad_request("reference_date is out of range"));
    }
    Ok(date)
}

pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<Uuid>,
    Query(params): Query<InvoiceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (account, closing_day, due_day) = load_card(&state, user.user_id, account_id).await?;
    let reference = reference_date(params.reference_date)?;
    let period = billing::billing_period(closing_day, reference);

    let invoice = build_invoice(&state, &account, period, closing_day, due_day).await?;
    Ok(Json(invoice))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<Uuid>,
    Query(params): Query<InvoiceHistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let (account, closing_day, due_day) = load_card(&state, user.user_id, account_id).await?;
    let reference = reference_date(params.reference_date)?;
    let months = params.months.unwrap_or(DEFAULT_INVOICE_MONTHS) as usize;

    let mut invoices = Vec::with_capacity(months);
    for period in billing::recent_periods(closing_day, reference, months) {
        invoices.push(build_invoice(&state, &account, period, closing_day, due_day).await?);
    }

    Ok(Json(invoices))
}

/// Marks the period as settled. No transaction is created.
pub async fn pay_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<Uuid>,
    body: Option<Json<PayInvoiceRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let (account, closing_day, _) = load_card(&state, user.user_id, account_id).await?;
    let reference = reference_date(body.and_then(|Json(req)| req.reference_date))?;
    let period = billing::billing_period(closing_day, reference);

    let payment = state
        .db
        .create_invoice_payment(user.user_id, account.account_id, period)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn unpay_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<Uuid>,
    Query(params): Query<InvoiceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (account, closing_day, _) = load_card(&state, user.user_id, account_id).await?;
    let reference = reference_date(params.reference_date)?;
    let period = billing::billing_period(closing_day, reference);

    if !state
        .db
        .delete_invoice_payment(user.user_id, account.account_id, period)
        .await?
    {
        return Err(AppError::not_found("Invoice payment"));
    }

    Ok(StatusCode::NO_CONTENT)
}
