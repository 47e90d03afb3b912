use super::{db_error, unique_error, Database};
use crate::models::{Account, AccountWithBalance, InvoicePayment, NewAccount};
use crate::services::billing::BillingPeriod;
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "account_id, user_id, name, account_type, initial_balance, \
     credit_limit, closing_day, due_day, color, icon, is_active, created_utc, updated_utc";

const BALANCE_SELECT: &str = r#"
    SELECT a.*,
           a.initial_balance + COALESCE(SUM(
               CASE t.transaction_type
                   WHEN 'income' THEN t.amount
                   WHEN 'expense' THEN -t.amount
                   ELSE 0
               END), 0) AS current_balance
    FROM accounts a
    LEFT JOIN transactions t ON t.account_id = a.account_id AND t.user_id = a.user_id
"#;

impl Database {
    #[instrument(skip(self, account), fields(user_id = %account.user_id))]
    pub async fn create_account(&self, account: &NewAccount) -> Result<Account, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_account"])
            .start_timer();

        let sql = format!(
            r#"
            INSERT INTO accounts (account_id, user_id, name, account_type, initial_balance,
                                  credit_limit, closing_day, due_day, color, icon, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let created = sqlx::query_as::<_, Account>(&sql)
            .bind(Uuid::new_v4())
            .bind(account.user_id)
            .bind(&account.name)
            .bind(account.account_type.as_str())
            .bind(account.initial_balance)
            .bind(account.credit_limit)
            .bind(account.closing_day)
            .bind(account.due_day)
            .bind(&account.color)
            .bind(&account.icon)
            .bind(account.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("create account"))?;

        timer.observe_duration();
        info!(account_id = %created.account_id, "Account created");

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_accounts(
        &self,
        user_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<AccountWithBalance>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_accounts"])
            .start_timer();

        let sql = format!(
            "{} WHERE a.user_id = $1 AND ($2 OR a.is_active) \
             GROUP BY a.account_id ORDER BY a.created_utc",
            BALANCE_SELECT
        );

        let accounts = sqlx::query_as::<_, AccountWithBalance>(&sql)
            .bind(user_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list accounts"))?;

        timer.observe_duration();
        Ok(accounts)
    }

    #[instrument(skip(self))]
    pub async fn get_account(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Option<Account>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_account"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND account_id = $2",
            ACCOUNT_COLUMNS
        );

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get account"))?;

        timer.observe_duration();
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn get_account_with_balance(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Option<AccountWithBalance>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_account_with_balance"])
            .start_timer();

        let sql = format!(
            "{} WHERE a.user_id = $1 AND a.account_id = $2 GROUP BY a.account_id",
            BALANCE_SELECT
        );

        let account = sqlx::query_as::<_, AccountWithBalance>(&sql)
            .bind(user_id)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get account"))?;

        timer.observe_duration();
        Ok(account)
    }

    /// Persist every mutable column of `account`.
    #[instrument(skip(self, account), fields(account_id = %account.account_id))]
    pub async fn update_account(&self, account: &Account) -> Result<Account, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_account"])
            .start_timer();

        let sql = format!(
            r#"
            UPDATE accounts
            SET name = $3, account_type = $4, initial_balance = $5, credit_limit = $6,
                closing_day = $7, due_day = $8, color = $9, icon = $10, is_active = $11,
                updated_utc = NOW()
            WHERE user_id = $1 AND account_id = $2
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let updated = sqlx::query_as::<_, Account>(&sql)
            .bind(account.user_id)
            .bind(account.account_id)
            .bind(&account.name)
            .bind(&account.account_type)
            .bind(account.initial_balance)
            .bind(account.credit_limit)
            .bind(account.closing_day)
            .bind(account.due_day)
            .bind(&account.color)
            .bind(&account.icon)
            .bind(account.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("update account"))?
            .ok_or_else(|| AppError::not_found("Account"))?;

        timer.observe_duration();
        Ok(updated)
    }

    /// Transactions keep their rows; their account reference is cleared.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, user_id: Uuid, account_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_account"])
            .start_timer();

        let result = sqlx::query("DELETE FROM accounts WHERE user_id = $1 AND account_id = $2")
            .bind(user_id)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete account"))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Invoice payments
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn get_invoice_payment(
        &self,
        account_id: Uuid,
        period: BillingPeriod,
    ) -> Result<Option<InvoicePayment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_payment"])
            .start_timer();

        let payment = sqlx::query_as::<_, InvoicePayment>(
            r#"
            SELECT payment_id, user_id, account_id, period_start, period_end, paid_utc
            FROM invoice_payments
            WHERE account_id = $1 AND period_start = $2 AND period_end = $3
            "#,
        )
        .bind(account_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get invoice payment"))?;

        timer.observe_duration();
        Ok(payment)
    }

    #[instrument(skip(self))]
    pub async fn create_invoice_payment(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        period: BillingPeriod,
    ) -> Result<InvoicePayment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice_payment"])
            .start_timer();

        let payment = sqlx::query_as::<_, InvoicePayment>(
            r#"
            INSERT INTO invoice_payments (payment_id, user_id, account_id, period_start, period_end)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING payment_id, user_id, account_id, period_start, period_end, paid_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(account_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_error("create invoice payment", "invoice already paid"))?;

        timer.observe_duration();
        info!(account_id = %account_id, period_end = %period.end, "Invoice marked as paid");

        Ok(payment)
    }

    #[instrument(skip(self))]
    pub async fn delete_invoice_payment(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        period: BillingPeriod,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice_payment"])
            .start_timer();

        let result = sqlx::query(
            r#"
            DELETE FROM invoice_payments
            WHERE user_id = $1 AND account_id = $2 AND period_start = $3 AND period_end = $4
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(period.start)
        .bind(period.end)
        .execute(&self.pool)
        .await
        .map_err(db_error("delete invoice payment"))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }
}
