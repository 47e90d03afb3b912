use super::{db_error, unique_error, Database};
use crate::models::Profile;
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::instrument;
use uuid::Uuid;

pub(crate) const USERNAME_CONFLICT: &str = "username already taken";

const PROFILE_COLUMNS: &str = "user_id, username, display_name, avatar_url, locale, currency, \
     notify_budget_alerts, notify_debt_reminders, notify_insights, created_utc, updated_utc";

impl Database {
    /// Fetch the profile, creating the default row on first access.
    #[instrument(skip(self))]
    pub async fn get_or_create_profile(&self, user_id: Uuid) -> Result<Profile, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_or_create_profile"])
            .start_timer();

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("create profile"))?;

        let sql = format!("SELECT {} FROM profiles WHERE user_id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("get profile"))?;

        timer.observe_duration();
        Ok(profile)
    }

    /// Whether `username` belongs to a user other than `user_id`.
    #[instrument(skip(self))]
    pub async fn username_taken(&self, username: &str, user_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["username_taken"])
            .start_timer();

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM profiles WHERE username = $1 AND user_id <> $2)",
        )
        .bind(username)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("check username"))?;

        timer.observe_duration();
        Ok(taken)
    }

    #[instrument(skip(self, profile), fields(user_id = %profile.user_id))]
    pub async fn update_profile(&self, profile: &Profile) -> Result<Profile, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_profile"])
            .start_timer();

        let sql = format!(
            r#"
            UPDATE profiles
            SET username = $2, display_name = $3, avatar_url = $4, locale = $5, currency = $6,
                notify_budget_alerts = $7, notify_debt_reminders = $8, notify_insights = $9,
                updated_utc = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let updated = sqlx::query_as::<_, Profile>(&sql)
            .bind(profile.user_id)
            .bind(&profile.username)
            .bind(&profile.display_name)
            .bind(&profile.avatar_url)
            .bind(&profile.locale)
            .bind(&profile.currency)
            .bind(profile.notify_budget_alerts)
            .bind(profile.notify_debt_reminders)
            .bind(profile.notify_insights)
            .fetch_optional(&self.pool)
            .await
            .map_err(unique_error("update profile", USERNAME_CONFLICT))?
            .ok_or_else(|| AppError::not_found("Profile"))?;

        timer.observe_duration();
        Ok(updated)
    }
}
