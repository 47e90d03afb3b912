use super::{db_error, Database};
use crate::models::{
    Investment, InvestmentSummary, InvestmentType, InvestmentTypeTotal, NewInvestment,
};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

impl Database {
    #[instrument(skip(self, investment), fields(user_id = %investment.user_id))]
    pub async fn create_investment(
        &self,
        investment: &NewInvestment,
    ) -> Result<Investment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_investment"])
            .start_timer();

        let created = sqlx::query_as::<_, Investment>(
            r#"
            INSERT INTO investments (investment_id, user_id, investment_type, name, amount, date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING investment_id, user_id, investment_type, name, amount, date, notes, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(investment.user_id)
        .bind(investment.investment_type.as_str())
        .bind(&investment.name)
        .bind(investment.amount)
        .bind(investment.date)
        .bind(&investment.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create investment"))?;

        timer.observe_duration();
        info!(investment_id = %created.investment_id, "Investment created");

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_investments(
        &self,
        user_id: Uuid,
        investment_type: Option<InvestmentType>,
    ) -> Result<Vec<Investment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_investments"])
            .start_timer();

        let investments = sqlx::query_as::<_, Investment>(
            r#"
            SELECT investment_id, user_id, investment_type, name, amount, date, notes, created_utc, updated_utc
            FROM investments
            WHERE user_id = $1 AND ($2::varchar IS NULL OR investment_type = $2)
            ORDER BY date DESC, created_utc DESC
            "#,
        )
        .bind(user_id)
        .bind(investment_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list investments"))?;

        timer.observe_duration();
        Ok(investments)
    }

    #[instrument(skip(self))]
    pub async fn get_investment(
        &self,
        user_id: Uuid,
        investment_id: Uuid,
    ) -> Result<Option<Investment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_investment"])
            .start_timer();

        let investment = sqlx::query_as::<_, Investment>(
            r#"
            SELECT investment_id, user_id, investment_type, name, amount, date, notes, created_utc, updated_utc
            FROM investments
            WHERE user_id = $1 AND investment_id = $2
            "#,
        )
        .bind(user_id)
        .bind(investment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get investment"))?;

        timer.observe_duration();
        Ok(investment)
    }

    #[instrument(skip(self, investment), fields(investment_id = %investment.investment_id))]
    pub async fn update_investment(&self, investment: &Investment) -> Result<Investment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_investment"])
            .start_timer();

        let updated = sqlx::query_as::<_, Investment>(
            r#"
            UPDATE investments
            SET investment_type = $3, name = $4, amount = $5, date = $6, notes = $7, updated_utc = NOW()
            WHERE user_id = $1 AND investment_id = $2
            RETURNING investment_id, user_id, investment_type, name, amount, date, notes, created_utc, updated_utc
            "#,
        )
        .bind(investment.user_id)
        .bind(investment.investment_id)
        .bind(&investment.investment_type)
        .bind(&investment.name)
        .bind(investment.amount)
        .bind(investment.date)
        .bind(&investment.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update investment"))?
        .ok_or_else(|| AppError::not_found("Investment"))?;

        timer.observe_duration();
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_investment(
        &self,
        user_id: Uuid,
        investment_id: Uuid,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_investment"])
            .start_timer();

        let result =
            sqlx::query("DELETE FROM investments WHERE user_id = $1 AND investment_id = $2")
                .bind(user_id)
                .bind(investment_id)
                .execute(&self.pool)
                .await
                .map_err(db_error("delete investment"))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    pub async fn investment_summary(&self, user_id: Uuid) -> Result<InvestmentSummary, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["investment_summary"])
            .start_timer();

        let by_type = sqlx::query_as::<_, InvestmentTypeTotal>(
            r#"
            SELECT investment_type, SUM(amount) AS total, COUNT(*) AS count
            FROM investments
            WHERE user_id = $1
            GROUP BY investment_type
            ORDER BY total DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("summarize investments"))?;

        timer.observe_duration();

        Ok(InvestmentSummary {
            total: by_type.iter().map(|t| t.total).sum(),
            by_type,
        })
    }
}
