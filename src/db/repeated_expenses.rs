use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::RepeatedExpense;
use crate::error::AppError;

pub struct RepeatedExpenseRepository;

impl RepeatedExpenseRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: &str,
        description: String,
        category: String,
        amount: f64,
    ) -> Result<RepeatedExpense, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let template = sqlx::query_as::<_, RepeatedExpense>(
            r#"
INSERT INTO repeated_expenses (id, user_id, description, category, amount, is_active, created_at)
VALUES (?, ?, ?, ?, ?, 1, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&description)
        .bind(&category)
        .bind(amount)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(template)
    }

    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<RepeatedExpense>, AppError> {
        let templates = sqlx::query_as::<_, RepeatedExpense>(
            "SELECT * FROM repeated_expenses WHERE user_id = ? ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(templates)
    }

    pub async fn get_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
        id: &str,
    ) -> Result<Option<RepeatedExpense>, AppError> {
        let template = sqlx::query_as::<_, RepeatedExpense>(
            "SELECT * FROM repeated_expenses WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(template)
    }

    pub async fn update_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
        id: &str,
        description: Option<String>,
        category: Option<String>,
        amount: Option<f64>,
        is_active: Option<bool>,
    ) -> Result<Option<RepeatedExpense>, AppError> {
        let Some(existing) = Self::get_for_user(pool, user_id, id).await? else {
            return Ok(None);
        };

        let template = sqlx::query_as::<_, RepeatedExpense>(
            r#"
UPDATE repeated_expenses SET description = ?, category = ?, amount = ?, is_active = ?
WHERE id = ? AND user_id = ?
RETURNING *
            "#,
        )
        .bind(description.unwrap_or(existing.description))
        .bind(category.unwrap_or(existing.category))
        .bind(amount.unwrap_or(existing.amount))
        .bind(is_active.unwrap_or(existing.is_active))
        .bind(id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(Some(template))
    }

    pub async fn delete_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
        id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM repeated_expenses WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
