use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::budgets::{BudgetQuery, CreateBudgetRequest, UpdateBudgetRequest};
use crate::handlers::transactions::check_ownership;
use crate::middleware::AuthUser;
use crate::models::NewBudget;
use crate::services::database::BUDGET_CONFLICT;
use crate::startup::AppState;

/// 409 when another budget already covers the category and period.
async fn ensure_unique(
    state: &AppState,
    user_id: Uuid,
    category_id: Option<Uuid>,
    month: i16,
    year: i32,
    ignore: Option<Uuid>,
) -> Result<(), AppError> {
    let existing = state
        .db
        .find_budget(user_id, category_id, month, year)
        .await?;
    match existing {
        Some(budget) if Some(budget.budget_id) != ignore => {
            Err(AppError::Conflict(anyhow!(BUDGET_CONFLICT)))
        }
        _ => Ok(()),
    }
}

pub async fn list_budgets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<BudgetQuery>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let budgets = state
        .db
        .list_budgets(user.user_id, params.month, params.year)
        .await?;
    Ok(Json(budgets))
}

pub async fn create_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateBudgetRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    check_ownership(&state, user.user_id, None, req.category_id).await?;
    ensure_unique(&state, user.user_id, req.category_id, req.month, req.year, None).await?;

    let budget = state
        .db
        .create_budget(&NewBudget {
            user_id: user.user_id,
            category_id: req.category_id,
            amount: req.amount,
            month: req.month,
            year: req.year,
        })
        .await?;

    let created = state
        .db
        .get_budget_with_spending(user.user_id, budget.budget_id)
        .await?
        .ok_or_else(|| AppError::not_found("Budget"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(budget_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let budget = state
        .db
        .get_budget_with_spending(user.user_id, budget_id)
        .await?
        .ok_or_else(|| AppError::not_found("Budget"))?;
    Ok(Json(budget))
}

pub async fn update_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(budget_id): Path<Uuid>,
    Json(req): Json<UpdateBudgetRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut budget = state
        .db
        .get_budget(user.user_id, budget_id)
        .await?
        .ok_or_else(|| AppError::not_found("Budget"))?;

    check_ownership(&state, user.user_id, None, req.category_id.flatten()).await?;

    if let Some(category_id) = req.category_id {
        budget.category_id = category_id;
    }
    if let Some(amount) = req.amount {
        budget.amount = amount;
    }
    if let Some(month) = req.month {
        budget.month = month;
    }
    if let Some(year) = req.year {
        budget.year = year;
    }

    ensure_unique(
        &state,
        user.user_id,
        budget.category_id,
        budget.month,
        budget.year,
        Some(budget.budget_id),
    )
    .await?;

    state.db.update_budget(&budget).await?;
    let updated = state
        .db
        .get_budget_with_spending(user.user_id, budget_id)
        .await?
        .ok_or_else(|| AppError::not_found("Budget"))?;

    Ok(Json(updated))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(budget_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_budget(user.user_id, budget_id).await? {
        return Err(AppError::not_found("Budget"));
    }
    Ok(StatusCode::NO_CONTENT)
}
