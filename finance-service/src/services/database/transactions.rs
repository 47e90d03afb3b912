use super::{db_error, like_pattern, Database};
use crate::models::{
    CategoryBreakdown, NewTransaction, Transaction, TransactionFilter, TransactionSummary,
    TransactionType,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::recurrence::DeleteScope;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::FromRow;
use std::collections::HashSet;
use tracing::{info, instrument};
use uuid::Uuid;

const TRANSACTION_COLUMNS: &str = "transaction_id, user_id, account_id, category_id, amount, \
     transaction_type, description, date, tags, attachment_url, installment_group_id, \
     installment_number, total_installments, recurring_group_id, recurrence_number, \
     total_recurrences, created_utc, updated_utc";

/// Income and expense totals of one calendar month.
#[derive(Debug, Clone, FromRow)]
pub struct MonthTotals {
    pub year: i32,
    pub month: i32,
    pub income: Decimal,
    pub expense: Decimal,
}

/// What makes an imported line look like an existing transaction.
pub type DuplicateKey = (NaiveDate, Decimal, String);

#[derive(FromRow)]
struct SummaryRow {
    total_income: Decimal,
    total_expense: Decimal,
    transaction_count: i64,
}

#[derive(FromRow)]
struct KeyRow {
    date: NaiveDate,
    amount: Decimal,
    transaction_type: String,
}

impl Database {
    /// Insert all rows atomically; either the whole group lands or none of it.
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    pub async fn insert_transactions(
        &self,
        rows: &[NewTransaction],
    ) -> Result<Vec<Transaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_transactions"])
            .start_timer();

        let sql = format!(
            r#"
            INSERT INTO transactions (transaction_id, user_id, account_id, category_id, amount,
                transaction_type, description, date, tags, attachment_url,
                installment_group_id, installment_number, total_installments,
                recurring_group_id, recurrence_number, total_recurrences)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transaction"))?;

        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            let inserted = sqlx::query_as::<_, Transaction>(&sql)
                .bind(Uuid::new_v4())
                .bind(row.user_id)
                .bind(row.account_id)
                .bind(row.category_id)
                .bind(row.amount)
                .bind(row.transaction_type.as_str())
                .bind(&row.description)
                .bind(row.date)
                .bind(&row.tags)
                .bind(&row.attachment_url)
                .bind(row.installment.map(|p| p.group_id))
                .bind(row.installment.map(|p| p.number))
                .bind(row.installment.map(|p| p.total))
                .bind(row.recurrence.map(|p| p.group_id))
                .bind(row.recurrence.map(|p| p.number))
                .bind(row.recurrence.map(|p| p.total))
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("insert transaction"))?;
            created.push(inserted);
        }

        tx.commit().await.map_err(db_error("commit transactions"))?;

        timer.observe_duration();
        info!(count = created.len(), "Transactions created");

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_transaction"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id = $1 AND transaction_id = $2",
            TRANSACTION_COLUMNS
        );

        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get transaction"))?;

        timer.observe_duration();
        Ok(transaction)
    }

    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_transactions"])
            .start_timer();

        let sql = format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
              AND ($4::varchar IS NULL OR transaction_type = $4)
              AND ($5::uuid IS NULL OR category_id = $5)
              AND ($6::uuid IS NULL OR account_id = $6)
              AND ($7::text IS NULL OR description ILIKE $7)
            ORDER BY date DESC, created_utc DESC
            LIMIT $8 OFFSET $9
            "#,
            TRANSACTION_COLUMNS
        );

        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.transaction_type.map(|t| t.as_str()))
            .bind(filter.category_id)
            .bind(filter.account_id)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list transactions"))?;

        timer.observe_duration();
        Ok(transactions)
    }

    /// Every transaction of the user in `[start, end]`, optionally on one account.
    #[instrument(skip(self))]
    pub async fn transactions_between(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transactions_between"])
            .start_timer();

        let sql = format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR account_id = $2)
              AND date BETWEEN $3 AND $4
            ORDER BY date, created_utc
            "#,
            TRANSACTION_COLUMNS
        );

        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .bind(account_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list transactions in range"))?;

        timer.observe_duration();
        Ok(transactions)
    }

    /// Persist the editable columns of a single row. Group membership is fixed.
    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.transaction_id))]
    pub async fn update_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Transaction, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_transaction"])
            .start_timer();

        let sql = format!(
            r#"
            UPDATE transactions
            SET account_id = $3, category_id = $4, amount = $5, transaction_type = $6,
                description = $7, date = $8, tags = $9, attachment_url = $10,
                updated_utc = NOW()
            WHERE user_id = $1 AND transaction_id = $2
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        let updated = sqlx::query_as::<_, Transaction>(&sql)
            .bind(transaction.user_id)
            .bind(transaction.transaction_id)
            .bind(transaction.account_id)
            .bind(transaction.category_id)
            .bind(transaction.amount)
            .bind(&transaction.transaction_type)
            .bind(&transaction.description)
            .bind(transaction.date)
            .bind(&transaction.tags)
            .bind(&transaction.attachment_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("update transaction"))?
            .ok_or_else(|| AppError::not_found("Transaction"))?;

        timer.observe_duration();
        Ok(updated)
    }

    /// Delete `transaction` and, depending on `scope`, the rest of its
    /// installment or recurring group. Returns the number of rows removed.
    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.transaction_id))]
    pub async fn delete_transaction(
        &self,
        transaction: &Transaction,
        scope: DeleteScope,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_transaction"])
            .start_timer();

        let group = match (
            transaction.installment_group_id,
            transaction.installment_number,
            transaction.recurring_group_id,
            transaction.recurrence_number,
        ) {
            (Some(group_id), Some(number), _, _) => {
                Some(("installment_group_id", "installment_number", group_id, number))
            }
            (_, _, Some(group_id), Some(number)) => {
                Some(("recurring_group_id", "recurrence_number", group_id, number))
            }
            _ => None,
        };

        let result = match (scope, group) {
            (DeleteScope::All, Some((group_col, _, group_id, _))) => {
                let sql = format!(
                    "DELETE FROM transactions WHERE user_id = $1 AND {} = $2",
                    group_col
                );
                sqlx::query(&sql)
                    .bind(transaction.user_id)
                    .bind(group_id)
                    .execute(&self.pool)
                    .await
            }
            (DeleteScope::Future, Some((group_col, number_col, group_id, number))) => {
                let sql = format!(
                    "DELETE FROM transactions WHERE user_id = $1 AND {} = $2 AND {} >= $3",
                    group_col, number_col
                );
                sqlx::query(&sql)
                    .bind(transaction.user_id)
                    .bind(group_id)
                    .bind(number)
                    .execute(&self.pool)
                    .await
            }
            _ => {
                sqlx::query("DELETE FROM transactions WHERE user_id = $1 AND transaction_id = $2")
                    .bind(transaction.user_id)
                    .bind(transaction.transaction_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(db_error("delete transaction"))?;

        timer.observe_duration();
        info!(deleted = result.rows_affected(), scope = ?scope, "Transactions deleted");

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    pub async fn transaction_summary(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<TransactionSummary, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transaction_summary"])
            .start_timer();

        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'income'), 0) AS total_income,
                   COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'expense'), 0) AS total_expense,
                   COUNT(*) AS transaction_count
            FROM transactions
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("summarize transactions"))?;

        timer.observe_duration();

        Ok(TransactionSummary {
            total_income: row.total_income,
            total_expense: row.total_expense,
            balance: row.total_income - row.total_expense,
            transaction_count: row.transaction_count,
        })
    }

    /// Totals per category, largest first. Uncategorised rows are grouped
    /// under "Sem categoria".
    #[instrument(skip(self))]
    pub async fn category_breakdown(
        &self,
        user_id: Uuid,
        transaction_type: TransactionType,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<CategoryBreakdown>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["category_breakdown"])
            .start_timer();

        let rows = sqlx::query_as::<_, CategoryBreakdown>(
            r#"
            SELECT t.category_id,
                   COALESCE(c.name, 'Sem categoria') AS category_name,
                   c.color,
                   SUM(t.amount) AS total,
                   COUNT(*) AS count
            FROM transactions t
            LEFT JOIN categories c ON c.category_id = t.category_id
            WHERE t.user_id = $1
              AND t.transaction_type = $2
              AND ($3::date IS NULL OR t.date >= $3)
              AND ($4::date IS NULL OR t.date <= $4)
            GROUP BY t.category_id, c.name, c.color
            ORDER BY total DESC
            "#,
        )
        .bind(user_id)
        .bind(transaction_type.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("break down transactions by category"))?;

        timer.observe_duration();
        Ok(CategoryBreakdown::with_percentages(rows))
    }

    /// Months with at least one transaction in `[start, end]`.
    #[instrument(skip(self))]
    pub async fn monthly_totals(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthTotals>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["monthly_totals"])
            .start_timer();

        let rows = sqlx::query_as::<_, MonthTotals>(
            r#"
            SELECT EXTRACT(YEAR FROM date)::int AS year,
                   EXTRACT(MONTH FROM date)::int AS month,
                   COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'income'), 0) AS income,
                   COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'expense'), 0) AS expense
            FROM transactions
            WHERE user_id = $1 AND date BETWEEN $2 AND $3
            GROUP BY 1, 2
            ORDER BY 1, 2
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("aggregate monthly totals"))?;

        timer.observe_duration();
        Ok(rows)
    }

    /// `(date, amount, type)` of every transaction in `[start, end]`.
    #[instrument(skip(self))]
    pub async fn duplicate_keys(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<DuplicateKey>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["duplicate_keys"])
            .start_timer();

        let rows = sqlx::query_as::<_, KeyRow>(
            r#"
            SELECT date, amount, transaction_type
            FROM transactions
            WHERE user_id = $1 AND date BETWEEN $2 AND $3
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("load existing transactions"))?;

        timer.observe_duration();

        Ok(rows
            .into_iter()
            .map(|r| (r.date, r.amount.normalize(), r.transaction_type))
            .collect())
    }
}
