use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::insights::GenerateInsightRequest;
use crate::middleware::AuthUser;
use crate::services::insights::InsightError;
use crate::startup::AppState;

/// Stored reports, newest period first.
pub async fn list_insights(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let insights = state.db.list_insights(user.user_id).await?;
    Ok(Json(insights))
}

pub async fn get_insight(
    State(state): State<AppState>,
    user: AuthUser,
    Path((year, month)): Path<(i32, i16)>,
) -> Result<impl IntoResponse, AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::bad_request("month must be between 1 and 12"));
    }
    let insight = state
        .db
        .get_insight_for_period(user.user_id, month, year)
        .await?
        .ok_or_else(|| AppError::not_found("Insight"))?;
    Ok(Json(insight))
}

pub async fn generate_insight(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GenerateInsightRequest>,
) -> Result<impl IntoResponse, InsightError> {
    req.validate().map_err(AppError::from)?;

    let insight = state
        .insights
        .generate(user.user_id, req.month, req.year, req.force)
        .await?;

    Ok(Json(insight))
}

pub async fn delete_insight(
    State(state): State<AppState>,
    user: AuthUser,
    Path(insight_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_insight(user.user_id, insight_id).await? {
        return Err(AppError::not_found("Insight"));
    }
    Ok(StatusCode::NO_CONTENT)
}
