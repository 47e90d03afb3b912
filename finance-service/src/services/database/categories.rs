use super::{db_error, Database};
use crate::models::{Category, CategoryType, NewCategory};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

impl Database {
    #[instrument(skip(self, category), fields(user_id = %category.user_id))]
    pub async fn create_category(&self, category: &NewCategory) -> Result<Category, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_category"])
            .start_timer();

        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (category_id, user_id, name, category_type, color, icon)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING category_id, user_id, name, category_type, color, icon, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category.user_id)
        .bind(&category.name)
        .bind(category.category_type.as_str())
        .bind(&category.color)
        .bind(&category.icon)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create category"))?;

        timer.observe_duration();
        info!(category_id = %created.category_id, "Category created");

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        user_id: Uuid,
        category_type: Option<CategoryType>,
    ) -> Result<Vec<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_categories"])
            .start_timer();

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, user_id, name, category_type, color, icon, created_utc
            FROM categories
            WHERE user_id = $1 AND ($2::varchar IS NULL OR category_type = $2)
            ORDER BY category_type, name
            "#,
        )
        .bind(user_id)
        .bind(category_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list categories"))?;

        timer.observe_duration();
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn get_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_category"])
            .start_timer();

        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, user_id, name, category_type, color, icon, created_utc
            FROM categories
            WHERE user_id = $1 AND category_id = $2
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get category"))?;

        timer.observe_duration();
        Ok(category)
    }

    #[instrument(skip(self, category), fields(category_id = %category.category_id))]
    pub async fn update_category(&self, category: &Category) -> Result<Category, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_category"])
            .start_timer();

        let updated = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $3, category_type = $4, color = $5, icon = $6
            WHERE user_id = $1 AND category_id = $2
            RETURNING category_id, user_id, name, category_type, color, icon, created_utc
            "#,
        )
        .bind(category.user_id)
        .bind(category.category_id)
        .bind(&category.name)
        .bind(&category.category_type)
        .bind(&category.color)
        .bind(&category.icon)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update category"))?
        .ok_or_else(|| AppError::not_found("Category"))?;

        timer.observe_duration();
        Ok(updated)
    }

    /// Transactions referencing the category become uncategorised; budgets
    /// on it are removed.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_category"])
            .start_timer();

        let result = sqlx::query("DELETE FROM categories WHERE user_id = $1 AND category_id = $2")
            .bind(user_id)
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete category"))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }
}
