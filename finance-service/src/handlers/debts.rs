use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::debts::{CreateDebtRequest, DebtPaymentRequest, DebtQuery, UpdateDebtRequest};
use crate::middleware::AuthUser;
use crate::models::{Debt, DebtStatus, DebtSummary, NewDebt};
use crate::startup::AppState;

async fn load_debt(state: &AppState, user_id: Uuid, debt_id: Uuid) -> Result<Debt, AppError> {
    state
        .db
        .get_debt(user_id, debt_id)
        .await?
        .ok_or_else(|| AppError::not_found("Debt"))
}

pub async fn list_debts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<DebtQuery>,
) -> Result<impl IntoResponse, AppError> {
    let debts = state.db.list_debts(user.user_id, params.status).await?;
    Ok(Json(debts))
}

pub async fn create_debt(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateDebtRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    if req.amount_paid > req.amount {
        return Err(AppError::bad_request("amount_paid cannot exceed amount"));
    }

    let debt = state
        .db
        .create_debt(&NewDebt {
            user_id: user.user_id,
            name: req.name.trim().to_string(),
            amount: req.amount,
            due_date: req.due_date,
            status: req.status.unwrap_or(DebtStatus::Pending),
            amount_paid: req.amount_paid,
            creditor: req.creditor,
            notes: req.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(debt)))
}

pub async fn debt_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let debts = state.db.list_debts(user.user_id, None).await?;
    Ok(Json(DebtSummary::from_debts(&debts)))
}

pub async fn get_debt(
    State(state): State<AppState>,
    user: AuthUser,
    Path(debt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_debt(&state, user.user_id, debt_id).await?))
}

pub async fn update_debt(
    State(state): State<AppState>,
    user: AuthUser,
    Path(debt_id): Path<Uuid>,
    Json(req): Json<UpdateDebtRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut debt = load_debt(&state, user.user_id, debt_id).await?;

    if let Some(name) = req.name {
        debt.name = name.trim().to_string();
    }
    if let Some(amount) = req.amount {
        debt.amount = amount;
    }
    if let Some(due_date) = req.due_date {
        debt.due_date = due_date;
    }
    if let Some(status) = req.status {
        debt.status = status.as_str().to_string();
    }
    if let Some(amount_paid) = req.amount_paid {
        debt.amount_paid = amount_paid;
    }
    if let Some(creditor) = req.creditor {
        debt.creditor = creditor;
    }
    if let Some(notes) = req.notes {
        debt.notes = notes;
    }

    if debt.amount_paid > debt.amount {
        return Err(AppError::bad_request("amount_paid cannot exceed amount"));
    }

    let updated = state.db.update_debt(&debt).await?;
    Ok(Json(updated))
}

/// Settle the debt in full.
pub async fn pay_debt(
    State(state): State<AppState>,
    user: AuthUser,
    Path(debt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut debt = load_debt(&state, user.user_id, debt_id).await?;
    debt.mark_paid();
    let updated = state.db.update_debt(&debt).await?;
    Ok(Json(updated))
}

pub async fn register_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(debt_id): Path<Uuid>,
    Json(req): Json<DebtPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut debt = load_debt(&state, user.user_id, debt_id).await?;
    if debt.parsed_status() == Some(DebtStatus::Paid) {
        return Err(AppError::bad_request("debt is already paid"));
    }

    debt.apply_payment(req.amount);
    let updated = state.db.update_debt(&debt).await?;
    Ok(Json(updated))
}

pub async fn delete_debt(
    State(state): State<AppState>,
    user: AuthUser,
    Path(debt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_debt(user.user_id, debt_id).await? {
        return Err(AppError::not_found("Debt"));
    }
    Ok(StatusCode::NO_CONTENT)
}
