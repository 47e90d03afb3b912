use super::{db_error, unique_error, Database};
use crate::models::{Budget, BudgetWithSpending, NewBudget};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

pub(crate) const BUDGET_CONFLICT: &str = "budget already exists for this category and period";

/// Budgets joined with their category name and the month's expenses: in the
/// category, or all of them for a whole-month budget.
const SPENDING_SELECT: &str = r#"
    SELECT b.*,
           c.name AS category_name,
           COALESCE((
               SELECT SUM(t.amount)
               FROM transactions t
               WHERE t.user_id = b.user_id
                 AND t.transaction_type = 'expense'
                 AND t.date >= make_date(b.year, b.month, 1)
                 AND t.date < (make_date(b.year, b.month, 1) + INTERVAL '1 month')::date
                 AND (b.category_id IS NULL OR t.category_id = b.category_id)
           ), 0) AS spent
    FROM budgets b
    LEFT JOIN categories c ON c.category_id = b.category_id
"#;

impl Database {
    #[instrument(skip(self, budget), fields(user_id = %budget.user_id))]
    pub async fn create_budget(&self, budget: &NewBudget) -> Result<Budget, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_budget"])
            .start_timer();

        let created = sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (budget_id, user_id, category_id, amount, month, year)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING budget_id, user_id, category_id, amount, month, year, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(budget.user_id)
        .bind(budget.category_id)
        .bind(budget.amount)
        .bind(budget.month)
        .bind(budget.year)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_error("create budget", BUDGET_CONFLICT))?;

        timer.observe_duration();
        info!(budget_id = %created.budget_id, "Budget created");

        Ok(created)
    }

    /// Budget of the user for the same category (or whole month) and period.
    #[instrument(skip(self))]
    pub async fn find_budget(
        &self,
        user_id: Uuid,
        category_id: Option<Uuid>,
        month: i16,
        year: i32,
    ) -> Result<Option<Budget>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_budget"])
            .start_timer();

        let budget = sqlx::query_as::<_, Budget>(
            r#"
            SELECT budget_id, user_id, category_id, amount, month, year, created_utc, updated_utc
            FROM budgets
            WHERE user_id = $1 AND category_id IS NOT DISTINCT FROM $2 AND month = $3 AND year = $4
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find budget"))?;

        timer.observe_duration();
        Ok(budget)
    }

    #[instrument(skip(self))]
    pub async fn list_budgets(
        &self,
        user_id: Uuid,
        month: Option<i16>,
        year: Option<i32>,
    ) -> Result<Vec<BudgetWithSpending>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_budgets"])
            .start_timer();

        let sql = format!(
            "{} WHERE b.user_id = $1 \
               AND ($2::smallint IS NULL OR b.month = $2) \
               AND ($3::int IS NULL OR b.year = $3) \
             ORDER BY b.year DESC, b.month DESC, c.name NULLS FIRST",
            SPENDING_SELECT
        );

        let budgets = sqlx::query_as::<_, BudgetWithSpending>(&sql)
            .bind(user_id)
            .bind(month)
            .bind(year)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list budgets"))?;

        timer.observe_duration();
        Ok(budgets.into_iter().map(BudgetWithSpending::with_totals).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_budget_with_spending(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
    ) -> Result<Option<BudgetWithSpending>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_budget_with_spending"])
            .start_timer();

        let sql = format!(
            "{} WHERE b.user_id = $1 AND b.budget_id = $2",
            SPENDING_SELECT
        );

        let budget = sqlx::query_as::<_, BudgetWithSpending>(&sql)
            .bind(user_id)
            .bind(budget_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get budget"))?;

        timer.observe_duration();
        Ok(budget.map(BudgetWithSpending::with_totals))
    }

    #[instrument(skip(self))]
    pub async fn get_budget(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
    ) -> Result<Option<Budget>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_budget"])
            .start_timer();

        let budget = sqlx::query_as::<_, Budget>(
            r#"
            SELECT budget_id, user_id, category_id, amount, month, year, created_utc, updated_utc
            FROM budgets
            WHERE user_id = $1 AND budget_id = $2
            "#,
        )
        .bind(user_id)
        .bind(budget_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get budget"))?;

        timer.observe_duration();
        Ok(budget)
    }

    #[instrument(skip(self, budget), fields(budget_id = %budget.budget_id))]
    pub async fn update_budget(&self, budget: &Budget) -> Result<Budget, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_budget"])
            .start_timer();

        let updated = sqlx::query_as::<_, Budget>(
            r#"
            UPDATE budgets
            SET category_id = $3, amount = $4, month = $5, year = $6, updated_utc = NOW()
            WHERE user_id = $1 AND budget_id = $2
            RETURNING budget_id, user_id, category_id, amount, month, year, created_utc, updated_utc
            "#,
        )
        .bind(budget.user_id)
        .bind(budget.budget_id)
        .bind(budget.category_id)
        .bind(budget.amount)
        .bind(budget.month)
        .bind(budget.year)
        .fetch_optional(&self.pool)
        .await
        .map_err(unique_error("update budget", BUDGET_CONFLICT))?
        .ok_or_else(|| AppError::not_found("Budget"))?;

        timer.observe_duration();
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_budget"])
            .start_timer();

        let result = sqlx::query("DELETE FROM budgets WHERE user_id = $1 AND budget_id = $2")
            .bind(user_id)
            .bind(budget_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete budget"))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }
}
