use super::{db_error, Database};
use crate::models::{Goal, GoalStatus, NewGoal};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

impl Database {
    #[instrument(skip(self, goal), fields(user_id = %goal.user_id))]
    pub async fn create_goal(&self, goal: &NewGoal) -> Result<Goal, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_goal"])
            .start_timer();

        let created = sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (goal_id, user_id, name, target_amount, current_amount, target_date, status, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING goal_id, user_id, name, target_amount, current_amount, target_date, status, category, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(goal.user_id)
        .bind(&goal.name)
        .bind(goal.target_amount)
        .bind(goal.current_amount)
        .bind(goal.target_date)
        .bind(goal.status.as_str())
        .bind(&goal.category)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create goal"))?;

        timer.observe_duration();
        info!(goal_id = %created.goal_id, "Goal created");

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_goals(
        &self,
        user_id: Uuid,
        status: Option<GoalStatus>,
    ) -> Result<Vec<Goal>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_goals"])
            .start_timer();

        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT goal_id, user_id, name, target_amount, current_amount, target_date, status, category, created_utc, updated_utc
            FROM goals
            WHERE user_id = $1 AND ($2::varchar IS NULL OR status = $2)
            ORDER BY target_date NULLS LAST, created_utc
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list goals"))?;

        timer.observe_duration();
        Ok(goals)
    }

    #[instrument(skip(self))]
    pub async fn get_goal(&self, user_id: Uuid, goal_id: Uuid) -> Result<Option<Goal>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_goal"])
            .start_timer();

        let goal = sqlx::query_as::<_, Goal>(
            r#"
            SELECT goal_id, user_id, name, target_amount, current_amount, target_date, status, category, created_utc, updated_utc
            FROM goals
            WHERE user_id = $1 AND goal_id = $2
            "#,
        )
        .bind(user_id)
        .bind(goal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get goal"))?;

        timer.observe_duration();
        Ok(goal)
    }

    #[instrument(skip(self, goal), fields(goal_id = %goal.goal_id))]
    pub async fn update_goal(&self, goal: &Goal) -> Result<Goal, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_goal"])
            .start_timer();

        let updated = sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals
            SET name = $3, target_amount = $4, current_amount = $5, target_date = $6,
                status = $7, category = $8, updated_utc = NOW()
            WHERE user_id = $1 AND goal_id = $2
            RETURNING goal_id, user_id, name, target_amount, current_amount, target_date, status, category, created_utc, updated_utc
            "#,
        )
        .bind(goal.user_id)
        .bind(goal.goal_id)
        .bind(&goal.name)
        .bind(goal.target_amount)
        .bind(goal.current_amount)
        .bind(goal.target_date)
        .bind(&goal.status)
        .bind(&goal.category)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update goal"))?
        .ok_or_else(|| AppError::not_found("Goal"))?;

        timer.observe_duration();
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_goal(&self, user_id: Uuid, goal_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_goal"])
            .start_timer();

        let result = sqlx::query("DELETE FROM goals WHERE user_id = $1 AND goal_id = $2")
            .bind(user_id)
            .bind(goal_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete goal"))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }
}
