use super::{db_error, Database};
use crate::models::{Debt, DebtStatus, NewDebt};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::NaiveDate;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

impl Database {
    #[instrument(skip(self, debt), fields(user_id = %debt.user_id))]
    pub async fn create_debt(&self, debt: &NewDebt) -> Result<Debt, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_debt"])
            .start_timer();

        let created = sqlx::query_as::<_, Debt>(
            r#"
            INSERT INTO debts (debt_id, user_id, name, amount, due_date, status, amount_paid, creditor, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING debt_id, user_id, name, amount, due_date, status, amount_paid, creditor, notes, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(debt.user_id)
        .bind(&debt.name)
        .bind(debt.amount)
        .bind(debt.due_date)
        .bind(debt.status.as_str())
        .bind(debt.amount_paid)
        .bind(&debt.creditor)
        .bind(&debt.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create debt"))?;

        timer.observe_duration();
        info!(debt_id = %created.debt_id, "Debt created");

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_debts(
        &self,
        user_id: Uuid,
        status: Option<DebtStatus>,
    ) -> Result<Vec<Debt>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_debts"])
            .start_timer();

        let debts = sqlx::query_as::<_, Debt>(
            r#"
            SELECT debt_id, user_id, name, amount, due_date, status, amount_paid, creditor, notes, created_utc, updated_utc
            FROM debts
            WHERE user_id = $1 AND ($2::varchar IS NULL OR status = $2)
            ORDER BY due_date, created_utc
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list debts"))?;

        timer.observe_duration();
        Ok(debts)
    }

    #[instrument(skip(self))]
    pub async fn get_debt(&self, user_id: Uuid, debt_id: Uuid) -> Result<Option<Debt>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_debt"])
            .start_timer();

        let debt = sqlx::query_as::<_, Debt>(
            r#"
            SELECT debt_id, user_id, name, amount, due_date, status, amount_paid, creditor, notes, created_utc, updated_utc
            FROM debts
            WHERE user_id = $1 AND debt_id = $2
            "#,
        )
        .bind(user_id)
        .bind(debt_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get debt"))?;

        timer.observe_duration();
        Ok(debt)
    }

    #[instrument(skip(self, debt), fields(debt_id = %debt.debt_id))]
    pub async fn update_debt(&self, debt: &Debt) -> Result<Debt, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_debt"])
            .start_timer();

        let updated = sqlx::query_as::<_, Debt>(
            r#"
            UPDATE debts
            SET name = $3, amount = $4, due_date = $5, status = $6, amount_paid = $7,
                creditor = $8, notes = $9, updated_utc = NOW()
            WHERE user_id = $1 AND debt_id = $2
            RETURNING debt_id, user_id, name, amount, due_date, status, amount_paid, creditor, notes, created_utc, updated_utc
            "#,
        )
        .bind(debt.user_id)
        .bind(debt.debt_id)
        .bind(&debt.name)
        .bind(debt.amount)
        .bind(debt.due_date)
        .bind(&debt.status)
        .bind(debt.amount_paid)
        .bind(&debt.creditor)
        .bind(&debt.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update debt"))?
        .ok_or_else(|| AppError::not_found("Debt"))?;

        timer.observe_duration();
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_debt(&self, user_id: Uuid, debt_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_debt"])
            .start_timer();

        let result = sqlx::query("DELETE FROM debts WHERE user_id = $1 AND debt_id = $2")
            .bind(user_id)
            .bind(debt_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete debt"))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    /// Flip every pending debt due before `today` to overdue, across all users.
    #[instrument(skip(self))]
    pub async fn mark_overdue_debts(&self, today: NaiveDate) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_overdue_debts"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE debts
            SET status = 'overdue', updated_utc = NOW()
            WHERE status = 'pending' AND due_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await
        .map_err(db_error("mark overdue debts"))?;

        timer.observe_duration();
        Ok(result.rows_affected())
    }
}
