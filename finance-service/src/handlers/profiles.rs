use anyhow::anyhow;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::profiles::{validate_username, UpdateProfileRequest};
use crate::middleware::AuthUser;
use crate::services::database::USERNAME_CONFLICT;
use crate::startup::AppState;

/// The caller's profile; the default row is created on first access.
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.db.get_or_create_profile(user.user_id).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut profile = state.db.get_or_create_profile(user.user_id).await?;

    if let Some(username) = req.username {
        let username = username
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty());
        if let Some(ref name) = username {
            validate_username(name).map_err(|_| {
                AppError::bad_request("username must be 3-30 characters of a-z, 0-9 or _")
            })?;
            if state.db.username_taken(name, user.user_id).await? {
                return Err(AppError::Conflict(anyhow!(USERNAME_CONFLICT)));
            }
        }
        profile.username = username;
    }
    if let Some(display_name) = req.display_name {
        profile.display_name = display_name;
    }
    if let Some(avatar_url) = req.avatar_url {
        profile.avatar_url = avatar_url;
    }
    if let Some(locale) = req.locale {
        profile.locale = locale;
    }
    if let Some(currency) = req.currency {
        profile.currency = currency;
    }
    if let Some(flag) = req.notify_budget_alerts {
        profile.notify_budget_alerts = flag;
    }
    if let Some(flag) = req.notify_debt_reminders {
        profile.notify_debt_reminders = flag;
    }
    if let Some(flag) = req.notify_insights {
        profile.notify_insights = flag;
    }

    let updated = state.db.update_profile(&profile).await?;
    Ok(Json(updated))
}
