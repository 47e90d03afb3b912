use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::categories::{CategoryQuery, CreateCategoryRequest, UpdateCategoryRequest};
use crate::middleware::AuthUser;
use crate::models::{Category, NewCategory};
use crate::services::categorizer::{fold, DefaultCategory, DEFAULT_CATEGORIES};
use crate::startup::AppState;

pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<CategoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let categories = state
        .db
        .list_categories(user.user_id, params.category_type)
        .await?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let category = state
        .db
        .create_category(&NewCategory {
            user_id: user.user_id,
            name: req.name.trim().to_string(),
            category_type: req.category_type,
            color: req.color,
            icon: req.icon,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Defaults whose folded name the user does not already have.
fn missing_defaults(existing: &[Category]) -> Vec<&'static DefaultCategory> {
    let present: HashSet<String> = existing.iter().map(|c| fold(c.name.trim())).collect();
    DEFAULT_CATEGORIES
        .iter()
        .filter(|d| !present.contains(&fold(d.name)))
        .collect()
}

pub async fn seed_default_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let existing = state.db.list_categories(user.user_id, None).await?;

    let mut created = Vec::new();
    for default in missing_defaults(&existing) {
        let category = state
            .db
            .create_category(&NewCategory {
                user_id: user.user_id,
                name: default.name.to_string(),
                category_type: default.category_type,
                color: Some(default.color.to_string()),
                icon: Some(default.icon.to_string()),
            })
            .await?;
        created.push(category);
    }

    info!(user_id = %user.user_id, created = created.len(), "Default categories seeded");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let category = state
        .db
        .get_category(user.user_id, category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut category = state
        .db
        .get_category(user.user_id, category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    if let Some(name) = req.name {
        category.name = name.trim().to_string();
    }
    if let Some(category_type) = req.category_type {
        category.category_type = category_type.as_str().to_string();
    }
    if let Some(color) = req.color {
        category.color = color;
    }
    if let Some(icon) = req.icon {
        category.icon = icon;
    }

    let updated = state.db.update_category(&category).await?;
    Ok(Json(updated))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_category(user.user_id, category_id).await? {
        return Err(AppError::not_found("Category"));
    }
    Ok(StatusCode::NO_CONTENT)
}
