use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::investments::{
    CreateInvestmentRequest, InvestmentQuery, UpdateInvestmentRequest,
};
use crate::middleware::AuthUser;
use crate::models::NewInvestment;
use crate::startup::AppState;

pub async fn list_investments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<InvestmentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let investments = state
        .db
        .list_investments(user.user_id, params.investment_type)
        .await?;
    Ok(Json(investments))
}

pub async fn create_investment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateInvestmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let investment = state
        .db
        .create_investment(&NewInvestment {
            user_id: user.user_id,
            investment_type: req.investment_type,
            name: req.name.trim().to_string(),
            amount: req.amount,
            date: req.date,
            notes: req.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(investment)))
}

pub async fn investment_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.db.investment_summary(user.user_id).await?;
    Ok(Json(summary))
}

pub async fn get_investment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(investment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let investment = state
        .db
        .get_investment(user.user_id, investment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Investment"))?;
    Ok(Json(investment))
}

pub async fn update_investment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(investment_id): Path<Uuid>,
    Json(req): Json<UpdateInvestmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut investment = state
        .db
        .get_investment(user.user_id, investment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Investment"))?;

    if let Some(investment_type) = req.investment_type {
        investment.investment_type = investment_type.as_str().to_string();
    }
    if let Some(name) = req.name {
        investment.name = name.trim().to_string();
    }
    if let Some(amount) = req.amount {
        investment.amount = amount;
    }
    if let Some(date) = req.date {
        investment.date = date;
    }
    if let Some(notes) = req.notes {
        investment.notes = notes;
    }

    let updated = state.db.update_investment(&investment).await?;
    Ok(Json(updated))
}

pub async fn delete_investment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(investment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_investment(user.user_id, investment_id).await? {
        return Err(AppError::not_found("Investment"));
    }
    Ok(StatusCode::NO_CONTENT)
}
