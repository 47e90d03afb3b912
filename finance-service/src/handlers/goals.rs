use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::goals::{ContributeRequest, CreateGoalRequest, GoalQuery, UpdateGoalRequest};
use crate::middleware::AuthUser;
use crate::models::{Goal, GoalStatus, NewGoal};
use crate::startup::AppState;

async fn load_goal(state: &AppState, user_id: Uuid, goal_id: Uuid) -> Result<Goal, AppError> {
    state
        .db
        .get_goal(user_id, goal_id)
        .await?
        .ok_or_else(|| AppError::not_found("Goal"))
}

pub async fn list_goals(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<GoalQuery>,
) -> Result<impl IntoResponse, AppError> {
    let goals = state.db.list_goals(user.user_id, params.status).await?;
    Ok(Json(goals))
}

pub async fn create_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateGoalRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let goal = state
        .db
        .create_goal(&NewGoal {
            user_id: user.user_id,
            name: req.name.trim().to_string(),
            target_amount: req.target_amount,
            current_amount: req.current_amount,
            target_date: req.target_date,
            status: req.status.unwrap_or(GoalStatus::Active),
            category: req.category,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn get_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(goal_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_goal(&state, user.user_id, goal_id).await?))
}

pub async fn update_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<UpdateGoalRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut goal = load_goal(&state, user.user_id, goal_id).await?;

    if let Some(name) = req.name {
        goal.name = name.trim().to_string();
    }
    if let Some(target_amount) = req.target_amount {
        goal.target_amount = target_amount;
    }
    if let Some(current_amount) = req.current_amount {
        goal.current_amount = current_amount;
    }
    if let Some(target_date) = req.target_date {
        goal.target_date = target_date;
    }
    if let Some(status) = req.status {
        goal.status = status.as_str().to_string();
    }
    if let Some(category) = req.category {
        goal.category = category;
    }

    let updated = state.db.update_goal(&goal).await?;
    Ok(Json(updated))
}

pub async fn contribute(
    State(state): State<AppState>,
    user: AuthUser,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<ContributeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut goal = load_goal(&state, user.user_id, goal_id).await?;
    if goal.parsed_status() == Some(GoalStatus::Cancelled) {
        return Err(AppError::bad_request("cannot contribute to a cancelled goal"));
    }

    goal.contribute(req.amount);
    let updated = state.db.update_goal(&goal).await?;

    info!(
        goal_id = %updated.goal_id,
        current_amount = %updated.current_amount,
        status = %updated.status,
        "Goal contribution recorded"
    );

    Ok(Json(updated))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(goal_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_goal(user.user_id, goal_id).await? {
        return Err(AppError::not_found("Goal"));
    }
    Ok(StatusCode::NO_CONTENT)
}
