use super::{db_error, Database};
use crate::models::{Insight, NewInsight};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::types::Json;
use tracing::{info, instrument};
use uuid::Uuid;

const INSIGHT_COLUMNS: &str = "insight_id, user_id, month, year, total_income, total_expense, \
     balance, transaction_count, report, model, prompt_tokens, completion_tokens, \
     generation_ms, created_utc";

impl Database {
    /// Store the report for `(user, month, year)`, replacing a previous one.
    #[instrument(skip(self, insight), fields(user_id = %insight.user_id, month = insight.month, year = insight.year))]
    pub async fn upsert_insight(&self, insight: &NewInsight) -> Result<Insight, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["upsert_insight"])
            .start_timer();

        let sql = format!(
            r#"
            INSERT INTO insights (insight_id, user_id, month, year, total_income, total_expense,
                balance, transaction_count, report, model, prompt_tokens, completion_tokens,
                generation_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id, month, year) DO UPDATE
            SET total_income = EXCLUDED.total_income,
                total_expense = EXCLUDED.total_expense,
                balance = EXCLUDED.balance,
                transaction_count = EXCLUDED.transaction_count,
                report = EXCLUDED.report,
                model = EXCLUDED.model,
                prompt_tokens = EXCLUDED.prompt_tokens,
                completion_tokens = EXCLUDED.completion_tokens,
                generation_ms = EXCLUDED.generation_ms,
                created_utc = NOW()
            RETURNING {}
            "#,
            INSIGHT_COLUMNS
        );

        let stored = sqlx::query_as::<_, Insight>(&sql)
            .bind(Uuid::new_v4())
            .bind(insight.user_id)
            .bind(insight.month)
            .bind(insight.year)
            .bind(insight.total_income)
            .bind(insight.total_expense)
            .bind(insight.balance)
            .bind(insight.transaction_count)
            .bind(Json(&insight.report))
            .bind(&insight.model)
            .bind(insight.prompt_tokens)
            .bind(insight.completion_tokens)
            .bind(insight.generation_ms)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("store insight"))?;

        timer.observe_duration();
        info!(insight_id = %stored.insight_id, "Insight stored");

        Ok(stored)
    }

    #[instrument(skip(self))]
    pub async fn list_insights(&self, user_id: Uuid) -> Result<Vec<Insight>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_insights"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM insights WHERE user_id = $1 ORDER BY year DESC, month DESC",
            INSIGHT_COLUMNS
        );

        let insights = sqlx::query_as::<_, Insight>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list insights"))?;

        timer.observe_duration();
        Ok(insights)
    }

    #[instrument(skip(self))]
    pub async fn get_insight_for_period(
        &self,
        user_id: Uuid,
        month: i16,
        year: i32,
    ) -> Result<Option<Insight>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_insight_for_period"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM insights WHERE user_id = $1 AND month = $2 AND year = $3",
            INSIGHT_COLUMNS
        );

        let insight = sqlx::query_as::<_, Insight>(&sql)
            .bind(user_id)
            .bind(month)
            .bind(year)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get insight"))?;

        timer.observe_duration();
        Ok(insight)
    }

    #[instrument(skip(self))]
    pub async fn delete_insight(&self, user_id: Uuid, insight_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_insight"])
            .start_timer();

        let result = sqlx::query("DELETE FROM insights WHERE user_id = $1 AND insight_id = $2")
            .bind(user_id)
            .bind(insight_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete insight"))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }
}
